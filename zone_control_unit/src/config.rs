//! Zone controller configuration loading.
//!
//! A single TOML file carries the shared service settings plus one table per
//! component (`[steering]`, `[motor]`, `[brake]`, `[current]`, `[supervisor]`,
//! `[e2e]`). Missing tables fall back to defaults; the merged result is
//! validated before use.

use std::path::Path;

use tracing::debug;
use zone_common::config::{ConfigError, ConfigLoader};
use zone_common::zone::config::ZoneConfig;

/// Load and validate the zone configuration from `path`.
pub fn load_config(path: &Path) -> Result<ZoneConfig, ConfigError> {
    let cfg = ZoneConfig::load(path)?;
    cfg.validate()?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(cfg)
}

/// Parse and validate an in-memory TOML document.
pub fn parse_config(content: &str) -> Result<ZoneConfig, ConfigError> {
    let cfg = ZoneConfig::from_toml(content)?;
    cfg.validate()?;
    Ok(cfg)
}
