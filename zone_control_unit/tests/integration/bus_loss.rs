//! Integration test: bus-loss latching.
//!
//! Bus-off, silence and a persistent error-warning state each latch bus loss
//! for the lifetime of the controller. Enable lines stay low from then on.

use zone_common::zone::config::{SupervisorConfig, ZoneConfig};
use zone_common::zone::error::FaultMask;
use zone_common::zone::state::{BusErrorState, Mode, SafetyStatus};
use zone_control_unit::cycle::CycleInputs;
use zone_control_unit::safety::BusMonitor;
use zone_control_unit::safety::bus::BusLossCause;

use super::Rig;

#[test]
fn one_bus_off_cycle_latches_for_200_active_cycles() {
    let mut rig = Rig::armed(&ZoneConfig::default());

    let inputs = CycleInputs {
        bus_state: BusErrorState::BusOff,
        ..rig.frames(20, 0, 0)
    };
    let out = rig.cycle(&inputs);
    assert!(out.safety.bus_loss);
    assert_eq!(out.mode, Mode::SafeStop);

    for i in 0..200i16 {
        // Changing commands, healthy transport.
        let inputs = rig.frames(20 + i % 7, i % 5, 0);
        let out = rig.cycle(&inputs);
        assert!(out.safety.bus_loss, "cycle {i}");
        assert!(out.safety.mask.contains(FaultMask::BUS_LOSS));
        assert_eq!(out.safety.status, SafetyStatus::Fault);
        assert!(!out.motor.r_en && !out.motor.l_en, "cycle {i}");
        assert!(!out.steering.enable_primary && !out.steering.enable_secondary);
        assert_eq!(out.motor.duty_hw, 0);
    }
    assert_eq!(rig.zc.mode(), Mode::SafeStop);
}

#[test]
fn silence_threshold_latches() {
    let cfg = SupervisorConfig::default();
    let mut bus = BusMonitor::new();
    for _ in 1..cfg.silence_cycles {
        assert!(!bus.step(BusErrorState::Active, false, &cfg));
    }
    assert!(bus.step(BusErrorState::Active, false, &cfg));
    assert_eq!(bus.cause(), Some(BusLossCause::Silence));

    // Traffic resumes; the latch holds.
    for _ in 0..50 {
        assert!(bus.step(BusErrorState::Active, true, &cfg));
    }
}

#[test]
fn warning_counter_resets_when_warning_clears() {
    let cfg = SupervisorConfig::default();
    let mut bus = BusMonitor::new();
    for _ in 0..3 {
        for _ in 1..cfg.warning_cycles {
            assert!(!bus.step(BusErrorState::Warning, true, &cfg));
        }
        assert!(!bus.step(BusErrorState::Active, true, &cfg));
        assert_eq!(bus.warning_cycles(), 0);
    }
    for _ in 1..cfg.warning_cycles {
        bus.step(BusErrorState::Warning, true, &cfg);
    }
    assert!(bus.step(BusErrorState::Warning, true, &cfg));
    assert_eq!(bus.cause(), Some(BusLossCause::ErrorWarning));
}

#[test]
fn silence_through_cycle_without_frames() {
    let cfg = ZoneConfig::default();
    let mut rig = Rig::armed(&cfg);
    let mut out = rig.last;
    for _ in 0..cfg.supervisor.silence_cycles {
        out = rig.cycle(&CycleInputs::default());
    }
    assert!(out.safety.bus_loss);
    assert!(!out.safety.watchdog_fed);
    assert_eq!(out.mode, Mode::SafeStop);
}
