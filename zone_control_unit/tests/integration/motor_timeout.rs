//! Integration test: propulsion command timeout and change-counted recovery.
//!
//! A torque command of 60 held unchanged for the timeout window forces zero
//! output; five distinct new values restore normal output on the fifth.

use zone_common::zone::config::{MotorConfig, ZoneConfig};
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::MotorFault;
use zone_common::zone::state::{Direction, Mode};
use zone_control_unit::channel::{MotorChannel, MotorInputs};

use super::Rig;

fn torque(t: i16) -> MotorInputs {
    MotorInputs {
        torque_cmd: t,
        ..MotorInputs::default()
    }
}

#[test]
fn held_command_times_out_then_recovers_on_fifth_change() {
    let cfg = MotorConfig::default();
    let mut m = MotorChannel::new(cfg.clone());

    let first = m.step(&torque(60), Mode::Run);
    assert_eq!(first.torque, 60);

    for held in 1..=cfg.timeout_cycles {
        let out = m.step(&torque(60), Mode::Run);
        if held < cfg.timeout_cycles {
            assert!(!out.timed_out, "held {held}");
            assert_eq!(out.torque, 60);
        } else {
            assert!(out.timed_out);
            assert_eq!(out.fault, MotorFault::CmdTimeout);
            assert_eq!(out.torque, 0);
            assert!(!out.r_en && !out.l_en);
        }
    }

    for (n, value) in [61, 62, 63, 64].into_iter().enumerate() {
        let out = m.step(&torque(value), Mode::Run);
        assert!(out.timed_out, "change {}", n + 1);
        assert_eq!(out.torque, 0);
    }

    let out = m.step(&torque(65), Mode::Run);
    assert!(!out.timed_out);
    assert_eq!(out.fault, MotorFault::None);
    assert_eq!(out.torque, 65);
    assert_eq!(out.direction, Direction::Forward);
    // 65 * 95 / 100 = 61.75, truncated
    assert_eq!(out.duty_pct, 61);
    assert_eq!(out.duty_hw, 6100);
    assert!(out.r_en && out.l_en);
}

#[test]
fn four_changes_are_not_enough() {
    let mut m = MotorChannel::new(MotorConfig::default());
    for _ in 0..=10 {
        m.step(&torque(60), Mode::Run);
    }
    assert!(m.last_outputs().timed_out);

    // Repeats between changes do not count and do not reset progress.
    for value in [10, 10, 20, 20, 30, 40] {
        m.step(&torque(value), Mode::Run);
    }
    assert!(m.last_outputs().timed_out);
    m.step(&torque(50), Mode::Run);
    assert!(!m.last_outputs().timed_out);
}

#[test]
fn stale_bus_value_through_cycle_zeroes_torque() {
    let cfg = ZoneConfig::default();
    let mut rig = Rig::armed(&cfg);

    // Fresh frames keep arriving, but the value never changes.
    let inputs = rig.frames(60, 0, rig.pedal());
    let mut out = rig.cycle(&inputs);
    assert_eq!(out.motor.torque, 60);
    for _ in 0..cfg.motor.timeout_cycles {
        let inputs = rig.frames(60, 0, rig.pedal());
        out = rig.cycle(&inputs);
    }
    assert!(out.motor.timed_out);
    assert_eq!(out.motor.torque, 0);
    assert!(!out.motor.r_en);
    // A stale command is not a safety fault on its own.
    assert_eq!(rig.zc.mode(), Mode::Run);
    assert!(rig.diag.contains(DiagEventId::MotorTimeout, EventStatus::Failed));

    for value in [61, 62, 63, 64, 65] {
        let inputs = rig.frames(value, 0, rig.pedal());
        out = rig.cycle(&inputs);
    }
    assert!(!out.motor.timed_out);
    assert_eq!(out.motor.torque, 65);
    assert!(rig.diag.contains(DiagEventId::MotorTimeout, EventStatus::Passed));
}
