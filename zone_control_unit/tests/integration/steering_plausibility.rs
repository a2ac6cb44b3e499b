//! Integration test: steering plausibility latch and disable escalation.
//!
//! Commanded +50° with feedback frozen at 0° confirms a plausibility fault
//! after the configured debounce, neutralizes the output and degrades the ECU.

use zone_common::zone::config::{SteeringConfig, ZoneConfig};
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::{FaultMask, SteeringFault};
use zone_common::zone::state::{DisableLevel, Mode, SafetyStatus};
use zone_control_unit::channel::{SteeringChannel, SteeringInputs};

use super::Rig;

// ── Helpers ─────────────────────────────────────────────────────────

fn wide_steering() -> SteeringConfig {
    SteeringConfig {
        min_angle_deg: -60,
        max_angle_deg: 60,
        rate_limit: 1000,
        ..SteeringConfig::default()
    }
}

fn frozen(cmd: i16) -> SteeringInputs {
    SteeringInputs {
        command_deg: cmd,
        feedback_deg: Ok(0),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn frozen_feedback_latches_on_fifth_cycle() {
    let mut ch = SteeringChannel::new(wide_steering());
    // Establishing cycle: the output moves to 50°, compared against feedback
    // from the next cycle on.
    assert_eq!(ch.step(&frozen(50)).angle10, 500);

    for cycle in 1..=5 {
        let out = ch.step(&frozen(50));
        if cycle < 5 {
            assert!(!out.latched, "cycle {cycle}");
            assert_eq!(out.angle10, 500);
        } else {
            assert_eq!(out.fault, SteeringFault::Plausibility);
            assert!(out.latched);
            assert_eq!(out.angle10, 0);
            assert_eq!(out.pwm_us, 1500);
            assert_eq!(out.disable_level, DisableLevel::Neutral);
        }
    }
}

#[test]
fn intermittent_mismatch_never_confirms() {
    let mut ch = SteeringChannel::new(wide_steering());
    ch.step(&frozen(50));
    for i in 0..20 {
        let feedback = if i % 4 == 3 { Ok(50) } else { Ok(0) };
        let out = ch.step(&SteeringInputs {
            command_deg: 50 - (i % 2),
            feedback_deg: feedback,
        });
        assert!(!out.latched, "iteration {i}");
    }
}

#[test]
fn plausibility_through_cycle_degrades_mode() {
    let cfg = ZoneConfig {
        steering: wide_steering(),
        ..ZoneConfig::default()
    };
    let mut rig = Rig::armed(&cfg);

    let mut latched_at = None;
    for cycle in 1..=6 {
        let inputs = zone_control_unit::cycle::CycleInputs {
            steer_feedback_deg: Ok(0),
            ..rig.frames(0, 50, 0)
        };
        let out = rig.cycle(&inputs);
        if out.steering.latched && latched_at.is_none() {
            latched_at = Some(cycle);
            assert_eq!(out.steering.angle10, 0);
            assert!(out.safety.mask.contains(FaultMask::STEERING));
            assert_eq!(out.safety.status, SafetyStatus::Degraded);
            assert_eq!(out.mode, Mode::Degraded);
        }
    }
    // Cycle 1 establishes 50°, cycles 2..=6 are the five mismatching ones.
    assert_eq!(latched_at, Some(6));
    assert!(rig.diag.contains(DiagEventId::SteerPlausibility, EventStatus::Failed));
    assert_eq!(rig.zc.mode(), Mode::Degraded);
}

#[test]
fn latch_clears_then_second_episode_escalates() {
    let cfg = SteeringConfig {
        latch_clear_cycles: 3,
        ..wide_steering()
    };
    let mut ch = SteeringChannel::new(cfg);

    let fail = SteeringInputs {
        command_deg: 10,
        feedback_deg: Err(zone_control_unit::channel::ReadFailure),
    };
    let first = ch.step(&fail);
    assert_eq!(first.fault, SteeringFault::ReadFail);
    assert_eq!(first.disable_level, DisableLevel::Neutral);

    // Three fault-free cycles clear the latch; commands keep changing.
    let mut out = first;
    for cmd in [11, 12, 13] {
        out = ch.step(&SteeringInputs {
            command_deg: cmd,
            feedback_deg: Ok(0),
        });
    }
    assert!(!out.latched);

    let second = ch.step(&fail);
    assert!(second.latched);
    assert_eq!(second.disable_level, DisableLevel::PrimaryDisable);
    assert!(!second.enable_primary);
    assert!(second.enable_secondary);
    assert_eq!(ch.episodes(), 2);
}
