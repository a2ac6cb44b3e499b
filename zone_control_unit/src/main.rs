//! # Zone Control Unit
//!
//! Bench runner for the zone controller safety core. Loads the TOML
//! configuration, plays a scenario file through the 10 ms cycle and reports
//! the outcome. Exits non-zero when loading fails or the scenario's expected
//! final mode is not reached.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use zone_common::config::{ConfigError, LogLevel};
use zone_common::consts::DEFAULT_CONFIG_PATH;
use zone_common::zone::config::ZoneConfig;
use zone_control_unit::config::load_config;
use zone_control_unit::scenario::{Scenario, ScenarioRunner};

/// Zone Control Unit: scripted safety-core runner
#[derive(Parser, Debug)]
#[command(name = "zone_control_unit")]
#[command(version)]
#[command(about = "Vehicle zone controller safety core, scenario runner")]
struct Args {
    /// Path to the zone configuration TOML.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Scenario TOML to play back.
    #[arg(long, value_name = "FILE")]
    scenario: PathBuf,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Config is needed before tracing for its log level; report failures after.
    let loaded = load_config(&args.config);
    let level = match &loaded {
        Ok(cfg) => cfg.shared.log_level,
        Err(_) => LogLevel::Info,
    };
    setup_tracing(&args, level);

    info!("Zone Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let cfg = match loaded {
        Ok(cfg) => cfg,
        Err(ConfigError::FileNotFound) => {
            warn!(
                "Config '{}' not found, using defaults",
                args.config.display()
            );
            ZoneConfig::default()
        }
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, &cfg) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Zone Control Unit finished");
}

fn run(args: &Args, cfg: &ZoneConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        service = %cfg.shared.service_name,
        steer_timeout = cfg.steering.timeout_cycles,
        motor_timeout = cfg.motor.timeout_cycles,
        brake_timeout = cfg.brake.timeout_cycles,
        "Config OK"
    );

    let scenario = Scenario::load(&args.scenario)?;
    info!(
        "Scenario '{}' loaded: {} phases, {} cycles",
        scenario.name,
        scenario.phases.len(),
        scenario.total_cycles()
    );

    let mut runner = ScenarioRunner::new(cfg)?;
    let outcome = runner.run(&scenario)?;

    let last = &outcome.final_outputs;
    info!(
        mode = ?last.mode,
        status = ?last.safety.status,
        mask = format_args!("{:#06x}", last.safety.mask.bits()),
        torque = last.motor.torque,
        steer_pwm_us = last.steering.pwm_us,
        brake_pct = last.brake.brake_pct,
        confirmed_dtcs = runner.controller().event_memory().confirmed_count(),
        "Scenario complete"
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
