//! Scripted bench scenarios.
//!
//! A scenario file is a list of `[[phase]]` tables played back cycle by
//! cycle through a [`ZoneController`]. Command values persist from one phase
//! to the next until overridden. Feedback defaults to an ideal actuator that
//! follows the previous cycle's output.
//!
//! ```toml
//! name = "plausibility"
//! expect_final_mode = "degraded"
//! pedal_ripple_pct = 1
//!
//! [[phase]]
//! name = "arm"
//! cycles = 1
//! mode_request = "run"
//!
//! [[phase]]
//! name = "frozen sensor"
//! cycles = 10
//! steer_deg = 20
//! steer_feedback_deg = 0
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use zone_common::config::{ConfigError, ConfigLoader};
use zone_common::consts::{
    CONTROL_PERIOD_MS, CURRENT_SAMPLE_PERIOD_MS, PERCENT_FULL, STEER_ANGLE_SCALE,
};
use zone_common::zone::config::ZoneConfig;
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::FaultMask;
use zone_common::zone::state::{BusErrorState, Mode, SafetyStatus, SelfTestResult};

use crate::channel::ReadFailure;
use crate::cycle::{
    CycleInputs, CycleOutputs, Frame, RX_BRAKE, RX_STEER, RX_TORQUE, ZoneCodec, ZoneController,
    command_frame, zone_codec,
};
use crate::diag::DiagnosticSink;

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario file: {0}")]
    Load(#[from] ConfigError),
    #[error("scenario invalid: {0}")]
    Invalid(String),
    #[error("final mode {actual:?}, expected {expected:?}")]
    ModeMismatch { expected: Mode, actual: Mode },
}

// ─── File format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub expect_final_mode: Option<Mode>,
    /// Brake command noise [%], applied on every other cycle. A resting
    /// pedal with zero ripple times out the brake watchdog.
    pub pedal_ripple_pct: u8,
    #[serde(rename = "phase")]
    pub phases: Vec<Phase>,
}

/// One block of identical cycles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Phase {
    pub name: String,
    pub cycles: u32,
    pub torque: Option<i16>,
    pub steer_deg: Option<i16>,
    pub brake_pct: Option<i16>,
    /// Fixed steering feedback; follows the output when absent.
    pub steer_feedback_deg: Option<i16>,
    /// Fixed brake feedback; follows the output when absent.
    pub brake_feedback_pct: Option<u8>,
    pub steer_feedback_fail: bool,
    pub brake_feedback_fail: bool,
    pub emergency_stop: bool,
    pub overtemp: bool,
    pub direction_mismatch: bool,
    pub stall: bool,
    pub battery_fault: bool,
    pub derate_pct: u8,
    pub bus_state: BusErrorState,
    pub self_test: SelfTestResult,
    /// Applied on the first cycle of the phase only.
    pub mode_request: Option<Mode>,
    /// Motor current for every 1 ms sample of the phase [mA].
    pub current_ma: u32,
    /// Transmit nothing during this phase.
    pub silent: bool,
    /// Flip one payload bit of every torque frame.
    pub corrupt_torque: bool,
}

impl Default for Phase {
    fn default() -> Self {
        Self {
            name: String::new(),
            cycles: 1,
            torque: None,
            steer_deg: None,
            brake_pct: None,
            steer_feedback_deg: None,
            brake_feedback_pct: None,
            steer_feedback_fail: false,
            brake_feedback_fail: false,
            emergency_stop: false,
            overtemp: false,
            direction_mismatch: false,
            stall: false,
            battery_fault: false,
            derate_pct: 100,
            bus_state: BusErrorState::Active,
            self_test: SelfTestResult::Pass,
            mode_request: None,
            current_ma: 0,
            silent: false,
            corrupt_torque: false,
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let scenario = <Self as ConfigLoader>::load(path)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn parse(content: &str) -> Result<Self, ScenarioError> {
        let scenario = <Self as ConfigLoader>::from_toml(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.phases.is_empty() {
            return Err(ScenarioError::Invalid("no [[phase]] entries".to_string()));
        }
        if let Some(p) = self.phases.iter().find(|p| p.cycles == 0) {
            return Err(ScenarioError::Invalid(format!(
                "phase '{}' has zero cycles",
                p.name
            )));
        }
        Ok(())
    }

    pub fn total_cycles(&self) -> u64 {
        self.phases.iter().map(|p| p.cycles as u64).sum()
    }
}

// ─── Runner ─────────────────────────────────────────────────────────

/// State of the controller at the end of a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSummary {
    pub name: String,
    pub cycles: u32,
    pub mode: Mode,
    pub status: SafetyStatus,
    pub mask: FaultMask,
    pub torque: i16,
    pub steer_angle10: i16,
    pub brake_pct: u8,
    /// Diagnostic status changes seen during the phase.
    pub diag_transitions: u32,
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub phases: Vec<PhaseSummary>,
    pub final_outputs: CycleOutputs,
}

impl ScenarioOutcome {
    #[inline]
    pub fn final_mode(&self) -> Mode {
        self.final_outputs.mode
    }
}

/// Logs and counts diagnostic transitions.
#[derive(Debug, Default)]
struct TraceSink {
    transitions: u32,
}

impl DiagnosticSink for TraceSink {
    fn report(&mut self, event: DiagEventId, status: EventStatus) {
        self.transitions += 1;
        info!(?event, ?status, "diagnostic event");
    }
}

/// Last values put on the bus, carried across phases.
#[derive(Debug, Clone, Copy, Default)]
struct BusCommands {
    torque: i16,
    steer_deg: i16,
    brake_pct: i16,
}

pub struct ScenarioRunner {
    controller: ZoneController,
    sender: ZoneCodec,
    commands: BusCommands,
    last: CycleOutputs,
    ripple_pct: u8,
}

impl ScenarioRunner {
    pub fn new(cfg: &ZoneConfig) -> Result<Self, ScenarioError> {
        Ok(Self {
            controller: ZoneController::new(cfg)?,
            sender: zone_codec(cfg),
            commands: BusCommands::default(),
            last: CycleOutputs::default(),
            ripple_pct: 0,
        })
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<ScenarioOutcome, ScenarioError> {
        info!(
            name = %scenario.name,
            phases = scenario.phases.len(),
            cycles = scenario.total_cycles(),
            "scenario start"
        );

        self.ripple_pct = scenario.pedal_ripple_pct.min(PERCENT_FULL);
        let mut phases = Vec::with_capacity(scenario.phases.len());
        for phase in &scenario.phases {
            let summary = self.run_phase(phase);
            info!(
                phase = %summary.name,
                mode = ?summary.mode,
                status = ?summary.status,
                mask = format_args!("{:#06x}", summary.mask.bits()),
                torque = summary.torque,
                steer10 = summary.steer_angle10,
                brake = summary.brake_pct,
                "phase complete"
            );
            phases.push(summary);
        }

        let outcome = ScenarioOutcome {
            phases,
            final_outputs: self.last,
        };
        if let Some(expected) = scenario.expect_final_mode {
            let actual = outcome.final_mode();
            if actual != expected {
                return Err(ScenarioError::ModeMismatch { expected, actual });
            }
        }
        Ok(outcome)
    }

    fn run_phase(&mut self, phase: &Phase) -> PhaseSummary {
        if let Some(v) = phase.torque {
            self.commands.torque = v;
        }
        if let Some(v) = phase.steer_deg {
            self.commands.steer_deg = v;
        }
        if let Some(v) = phase.brake_pct {
            self.commands.brake_pct = v;
        }

        let mut sink = TraceSink::default();
        for n in 0..phase.cycles {
            for _ in 0..CONTROL_PERIOD_MS / CURRENT_SAMPLE_PERIOD_MS {
                self.controller.sample_current(phase.current_ma);
            }
            let inputs = self.inputs(phase, n == 0);
            self.last = self.controller.run_cycle(&inputs, &mut sink);
            debug!(
                cycle = self.controller.cycle_count(),
                mode = ?self.last.mode,
                mask = self.last.safety.mask.bits(),
                "cycle"
            );
        }

        PhaseSummary {
            name: phase.name.clone(),
            cycles: phase.cycles,
            mode: self.last.mode,
            status: self.last.safety.status,
            mask: self.last.safety.mask,
            torque: self.last.motor.torque,
            steer_angle10: self.last.steering.angle10,
            brake_pct: self.last.brake.brake_pct,
            diag_transitions: sink.transitions,
        }
    }

    fn inputs(&mut self, phase: &Phase, first: bool) -> CycleInputs {
        let (torque_frame, steer_frame, brake_frame) = if phase.silent {
            (None, None, None)
        } else {
            let brake = self.pedal();
            let mut torque = self.stamp(RX_TORQUE, self.commands.torque);
            if phase.corrupt_torque {
                torque[2] ^= 0x01;
            }
            (
                Some(torque),
                Some(self.stamp(RX_STEER, self.commands.steer_deg)),
                Some(self.stamp(RX_BRAKE, brake)),
            )
        };

        let steer_feedback_deg = if phase.steer_feedback_fail {
            Err(ReadFailure)
        } else {
            Ok(phase
                .steer_feedback_deg
                .unwrap_or(self.last.steering.angle10 / STEER_ANGLE_SCALE))
        };
        let brake_feedback_pct = if phase.brake_feedback_fail {
            Err(ReadFailure)
        } else {
            Ok(phase.brake_feedback_pct.unwrap_or(self.last.brake.brake_pct))
        };

        CycleInputs {
            torque_frame,
            steer_frame,
            brake_frame,
            steer_feedback_deg,
            brake_feedback_pct,
            emergency_stop: phase.emergency_stop,
            derate_pct: phase.derate_pct,
            overtemp: phase.overtemp,
            direction_mismatch: phase.direction_mismatch,
            stall: phase.stall,
            battery_fault: phase.battery_fault,
            self_test: phase.self_test,
            bus_state: phase.bus_state,
            mode_request: if first { phase.mode_request } else { None },
        }
    }

    fn stamp(&mut self, slot: u8, value: i16) -> Frame {
        let mut frame = command_frame(value);
        // Slots are fixed and frames are full length, so protect cannot fail.
        if let Err(e) = self.sender.protect(slot, &mut frame) {
            debug!(slot, error = %e, "sender stamp failed");
        }
        frame
    }

    /// Brake command with ripple on odd cycles, kept inside 0..=100.
    fn pedal(&self) -> i16 {
        let base = self.commands.brake_pct;
        let ripple = self.ripple_pct as i16;
        if ripple == 0 || self.controller.cycle_count() % 2 == 0 {
            base
        } else if base + ripple <= PERCENT_FULL as i16 {
            base + ripple
        } else {
            base - ripple
        }
    }

    #[inline]
    pub const fn controller(&self) -> &ZoneController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(toml: &str) -> Result<ScenarioOutcome, ScenarioError> {
        let scenario = Scenario::parse(toml)?;
        ScenarioRunner::new(&ZoneConfig::default())?.run(&scenario)
    }

    #[test]
    fn parses_phases_with_defaults() {
        let s = Scenario::parse(
            r#"
            name = "p"
            [[phase]]
            mode_request = "run"
            [[phase]]
            cycles = 5
            torque = 20
            bus_state = "warning"
            "#,
        )
        .unwrap();
        assert_eq!(s.phases.len(), 2);
        assert_eq!(s.phases[0].cycles, 1);
        assert_eq!(s.phases[0].mode_request, Some(Mode::Run));
        assert_eq!(s.phases[1].bus_state, BusErrorState::Warning);
        assert_eq!(s.phases[1].derate_pct, 100);
        assert_eq!(s.total_cycles(), 6);
    }

    #[test]
    fn load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"f\"\n[[phase]]\ncycles = 3").unwrap();
        let s = Scenario::load(file.path()).unwrap();
        assert_eq!(s.name, "f");
        assert_eq!(s.total_cycles(), 3);

        assert!(matches!(
            Scenario::load(Path::new("/nonexistent/run.toml")),
            Err(ScenarioError::Load(ConfigError::FileNotFound))
        ));
    }

    #[test]
    fn rejects_empty_and_zero_cycle_phases() {
        assert!(matches!(
            Scenario::parse("name = \"x\""),
            Err(ScenarioError::Invalid(_))
        ));
        assert!(matches!(
            Scenario::parse("[[phase]]\ncycles = 0\n"),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn nominal_drive_stays_in_run() {
        let outcome = run(
            r#"
            expect_final_mode = "run"
            [[phase]]
            name = "arm"
            mode_request = "run"
            [[phase]]
            name = "drive"
            cycles = 5
            torque = 30
            "#,
        )
        .unwrap();
        let drive = &outcome.phases[1];
        assert_eq!(drive.status, SafetyStatus::Ok);
        assert_eq!(drive.torque, 30);
        assert_eq!(drive.brake_pct, 0);
    }

    #[test]
    fn silence_latches_bus_loss() {
        let outcome = run(
            r#"
            [[phase]]
            mode_request = "run"
            [[phase]]
            cycles = 25
            silent = true
            "#,
        )
        .unwrap();
        let last = &outcome.phases[1];
        assert!(last.mask.contains(FaultMask::BUS_LOSS));
        assert_eq!(last.mode, Mode::SafeStop);
    }

    #[test]
    fn expected_mode_mismatch_is_an_error() {
        let err = run(
            r#"
            expect_final_mode = "shutdown"
            [[phase]]
            mode_request = "run"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::ModeMismatch {
                expected: Mode::Shutdown,
                actual: Mode::Run
            }
        ));
    }

    #[test]
    fn pedal_ripple_keeps_brake_command_fresh() {
        let outcome = run(
            r#"
            expect_final_mode = "run"
            pedal_ripple_pct = 1
            [[phase]]
            mode_request = "run"
            [[phase]]
            cycles = 30
            torque = 20
            brake_pct = 100
            "#,
        )
        .unwrap();
        let drive = &outcome.phases[1];
        assert!(drive.mask.is_empty());
        // Full brake ripples downward.
        assert!(drive.brake_pct == 99 || drive.brake_pct == 100);
    }

    #[test]
    fn resting_pedal_without_ripple_latches_brake() {
        let outcome = run(
            r#"
            [[phase]]
            mode_request = "run"
            [[phase]]
            cycles = 12
            torque = 20
            "#,
        )
        .unwrap();
        let drive = &outcome.phases[1];
        assert!(drive.mask.contains(FaultMask::BRAKE));
        assert_eq!(drive.brake_pct, 100);
        assert_eq!(drive.torque, 0);
        assert_eq!(drive.mode, Mode::Degraded);
    }

    #[test]
    fn runner_rejects_invalid_config() {
        let mut cfg = ZoneConfig::default();
        cfg.steering.max_angle_deg = 0;
        assert!(matches!(
            ScenarioRunner::new(&cfg),
            Err(ScenarioError::Load(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn overcurrent_phase_safe_stops() {
        let outcome = run(
            r#"
            [[phase]]
            mode_request = "run"
            [[phase]]
            cycles = 2
            torque = 50
            current_ma = 40000
            "#,
        )
        .unwrap();
        assert!(outcome.phases[1].mask.contains(FaultMask::OVERCURRENT));
        assert_eq!(outcome.final_mode(), Mode::SafeStop);
    }
}
