//! Integration test: forward-only mode arbitration.

use zone_common::prelude::{Mode, ZoneConfig};
use zone_control_unit::cycle::CycleInputs;
use zone_control_unit::state::{ModeArbiter, ModeTransition, is_transition_valid};

use super::Rig;

/// Requests that walk a fresh arbiter into `mode`.
fn path_to(mode: Mode) -> &'static [Mode] {
    match mode {
        Mode::Startup => &[],
        Mode::Run => &[Mode::Run],
        Mode::Degraded => &[Mode::Run, Mode::Degraded],
        Mode::SafeStop => &[Mode::Run, Mode::SafeStop],
        Mode::Shutdown => &[Mode::Run, Mode::Shutdown],
    }
}

fn arbiter_in(mode: Mode) -> ModeArbiter {
    let mut arb = ModeArbiter::new();
    for &m in path_to(mode) {
        assert!(arb.request(m).is_accepted());
    }
    assert_eq!(arb.mode(), mode);
    arb
}

#[test]
fn every_pair_follows_the_transition_rule() {
    for a in Mode::ALL {
        for b in Mode::ALL {
            let expected = b == a
                || (a != Mode::Shutdown
                    && b.ordinal() > a.ordinal()
                    && (a != Mode::Startup || b == Mode::Run));
            assert_eq!(is_transition_valid(a, b), expected, "{a:?} -> {b:?}");

            let mut arb = arbiter_in(a);
            let result = arb.request(b);
            assert_eq!(result.is_accepted(), expected, "{a:?} -> {b:?}");
            assert_eq!(arb.mode(), if expected { b } else { a });
        }
    }
}

#[test]
fn rejected_requests_report_a_reason() {
    let mut arb = arbiter_in(Mode::SafeStop);
    match arb.request(Mode::Run) {
        ModeTransition::Rejected(reason) => assert!(!reason.is_empty()),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn controller_never_recovers_backwards() {
    let mut rig = Rig::armed(&ZoneConfig::default());

    let inputs = CycleInputs {
        stall: true,
        ..rig.frames(10, 0, 0)
    };
    assert_eq!(rig.cycle(&inputs).mode, Mode::Degraded);

    // Fault gone, external request for RUN: rejected.
    let inputs = CycleInputs {
        mode_request: Some(Mode::Run),
        ..rig.frames(11, 0, 0)
    };
    let out = rig.cycle(&inputs);
    assert_eq!(out.mode, Mode::Degraded);
    assert!(out.safety.mask.is_empty());

    let inputs = CycleInputs {
        mode_request: Some(Mode::Shutdown),
        ..rig.frames(12, 0, 0)
    };
    let out = rig.cycle(&inputs);
    assert_eq!(out.mode, Mode::Shutdown);
    assert!(out.mode_changed);

    // Shutdown withholds the watchdog feed.
    let inputs = rig.frames(13, 0, 0);
    let out = rig.cycle(&inputs);
    assert!(!out.safety.watchdog_fed);
    assert_eq!(out.motor.duty_hw, 0);
}

#[test]
fn startup_ignores_safety_policy() {
    let mut rig = Rig::new(&ZoneConfig::default());
    let inputs = CycleInputs {
        overtemp: true,
        ..rig.frames(0, 0, 0)
    };
    let out = rig.cycle(&inputs);
    assert_eq!(out.mode, Mode::Startup);

    let inputs = CycleInputs {
        mode_request: Some(Mode::Run),
        ..rig.frames(0, 0, 0)
    };
    assert_eq!(rig.cycle(&inputs).mode, Mode::Run);
}
