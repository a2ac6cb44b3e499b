//! Integration test: the shipped configuration and scenarios load and pass.

use std::path::PathBuf;

use zone_common::zone::config::ZoneConfig;
use zone_control_unit::config::load_config;
use zone_control_unit::scenario::{Scenario, ScenarioRunner};

fn crate_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(rel)
}

#[test]
fn shipped_config_matches_defaults() {
    let cfg = load_config(&crate_path("config/zone.toml")).unwrap();
    assert_eq!(cfg, ZoneConfig::default());
}

#[test]
fn shipped_scenarios_reach_expected_mode() {
    let cfg = load_config(&crate_path("config/zone.toml")).unwrap();
    for name in [
        "nominal_drive",
        "bus_off",
        "steering_sensor_loss",
        "overcurrent",
        "brake_command_stale",
    ] {
        let scenario = Scenario::load(&crate_path(&format!("scenarios/{name}.toml"))).unwrap();
        let outcome = ScenarioRunner::new(&cfg)
            .unwrap()
            .run(&scenario)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(Some(outcome.final_mode()), scenario.expect_final_mode);
    }
}
