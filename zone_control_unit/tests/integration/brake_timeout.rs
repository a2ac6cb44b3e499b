//! Integration test: brake command watchdog through the full cycle.
//!
//! A brake command of 50 % held unchanged for the timeout window latches the
//! brake at full force, cuts the motor and degrades the ECU. The latch clears
//! after the configured number of fault-free cycles once the command moves.

use zone_common::zone::config::ZoneConfig;
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::{BrakeFault, FaultMask};
use zone_common::zone::state::{Mode, SafetyStatus};

use super::Rig;

#[test]
fn held_brake_command_latches_and_cuts_motor() {
    let cfg = ZoneConfig::default();
    let mut rig = Rig::armed(&cfg);

    // First cycle sees 50 as a change; the next timeout_cycles - 1 repeats
    // stay below the window.
    for i in 0..cfg.brake.timeout_cycles as i16 {
        let inputs = rig.frames(20 + i % 3, 0, 50);
        let out = rig.cycle(&inputs);
        assert!(!out.brake.timed_out, "cycle {i}");
        assert_eq!(out.brake.brake_pct, 50);
        assert!(!out.brake.motor_cutoff);
        assert!(out.motor.r_en && out.motor.l_en);
        assert_eq!(out.mode, Mode::Run);
    }

    let inputs = rig.frames(21, 0, 50);
    let out = rig.cycle(&inputs);
    assert!(out.brake.timed_out);
    assert_eq!(out.brake.fault, BrakeFault::CmdTimeout);
    assert!(out.brake.latched);
    assert_eq!(out.brake.brake_pct, 100);
    assert!(out.brake.motor_cutoff);
    assert_eq!(out.motor.torque, 0);
    assert_eq!(out.motor.duty_hw, 0);
    assert!(!out.motor.r_en && !out.motor.l_en);
    assert!(out.safety.mask.contains(FaultMask::BRAKE));
    assert_eq!(out.safety.status, SafetyStatus::Degraded);
    assert_eq!(out.mode, Mode::Degraded);
    assert!(rig.diag.contains(DiagEventId::BrakeTimeout, EventStatus::Failed));
}

#[test]
fn latch_outlasts_cutoff_repeat_then_clears_on_fresh_commands() {
    let cfg = ZoneConfig::default();
    let mut rig = Rig::armed(&cfg);

    for i in 0..=cfg.brake.timeout_cycles as i16 {
        let inputs = rig.frames(20 + i % 3, 0, 50);
        rig.cycle(&inputs);
    }
    assert!(rig.last.brake.latched);

    // One changed value ends the timeout. Every further fault-free cycle
    // counts toward clearing; the cutoff holds past cutoff_repeat.
    let clear = cfg.brake.latch_clear_cycles as i16;
    for i in 1..clear {
        let inputs = rig.frames(20 + i % 3, 0, 30 + i % 2);
        let out = rig.cycle(&inputs);
        assert!(!out.brake.timed_out, "cycle {i}");
        assert!(out.brake.latched, "cycle {i}");
        assert_eq!(out.brake.fault, BrakeFault::Latched);
        assert_eq!(out.brake.brake_pct, 100);
        assert!(out.brake.motor_cutoff, "cycle {i}");
        assert!(!out.motor.r_en);
    }

    let inputs = rig.frames(22, 0, 30);
    let out = rig.cycle(&inputs);
    assert!(!out.brake.latched);
    assert_eq!(out.brake.brake_pct, 30);
    assert!(!out.brake.motor_cutoff);
    assert!(out.motor.r_en && out.motor.l_en);
    assert!(!out.safety.mask.contains(FaultMask::BRAKE));
    // Mode arbitration only moves forward.
    assert_eq!(out.mode, Mode::Degraded);
    assert!(rig.diag.contains(DiagEventId::BrakeTimeout, EventStatus::Passed));
}

#[test]
fn moving_pedal_never_times_out() {
    let cfg = ZoneConfig::default();
    let mut rig = Rig::armed(&cfg);

    for i in 0..100i16 {
        let inputs = rig.frames(20 + i % 3, 0, rig.pedal());
        let out = rig.cycle(&inputs);
        assert!(!out.brake.timed_out, "cycle {i}");
        assert!(!out.brake.latched, "cycle {i}");
    }
    assert_eq!(rig.zc.mode(), Mode::Run);
    assert!(!rig.diag.contains(DiagEventId::BrakeTimeout, EventStatus::Failed));
}
