//! Zone Common Library
//!
//! Shared constants, configuration loading and the type vocabulary used by
//! every zone-controller crate.
//!
//! # Module Structure
//!
//! - [`consts`] - Cycle periods, fixed-point scale factors, frame sizes
//! - [`config`] - Configuration loading traits and types
//! - [`zone`] - Modes, fault masks, channel fault codes and tuning parameters
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use zone_common::prelude::*;
//!
//! let mode = Mode::default();
//! assert_eq!(mode, Mode::Startup);
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod zone;
