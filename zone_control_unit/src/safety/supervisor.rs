//! Cross-channel safety supervisor.
//!
//! Each cycle the fault mask is rebuilt from the current flags, never
//! patched, so it always reflects this cycle. Status:
//!
//! | condition | status |
//! |-----------|--------|
//! | any critical bit | FAULT |
//! | emergency stop | FAULT |
//! | any other bit | DEGRADED |
//! | none | OK |
//!
//! The watchdog is fed only when no critical bit is set, the mode is not
//! SHUTDOWN, the last self-test did not fail and the bus is not bus-off. A
//! skipped feed adds the WATCHDOG bit after the status has been derived.

use tracing::{info, warn};
use zone_common::zone::config::SupervisorConfig;
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::FaultMask;
use zone_common::zone::state::{BusErrorState, Mode, SafetyStatus, SelfTestResult};

use super::bus::BusMonitor;
use crate::diag::DiagnosticSink;

/// Per-cycle fault flags collected from channels and external monitors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultFlags {
    pub overcurrent: bool,
    pub overtemp: bool,
    pub direction: bool,
    pub battery: bool,
    pub stall: bool,
    pub steering: bool,
    pub brake: bool,
    pub bridge: bool,
}

impl FaultFlags {
    fn to_mask(self) -> FaultMask {
        let mut mask = FaultMask::empty();
        mask.set(FaultMask::OVERCURRENT, self.overcurrent);
        mask.set(FaultMask::OVERTEMP, self.overtemp);
        mask.set(FaultMask::DIRECTION, self.direction);
        mask.set(FaultMask::BATTERY, self.battery);
        mask.set(FaultMask::STALL, self.stall);
        mask.set(FaultMask::STEERING, self.steering);
        mask.set(FaultMask::BRAKE, self.brake);
        mask.set(FaultMask::BRIDGE, self.bridge);
        mask
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorInputs {
    pub flags: FaultFlags,
    pub emergency_stop: bool,
    /// Mode left by the previous arbitration.
    pub mode: Mode,
    pub self_test: SelfTestResult,
    pub bus_state: BusErrorState,
    /// Any frame received this cycle.
    pub rx_activity: bool,
}

/// Supervisor verdict for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyReport {
    pub mask: FaultMask,
    pub status: SafetyStatus,
    pub bus_loss: bool,
    /// Every actuator enable line must be driven low.
    pub force_enables_low: bool,
    pub watchdog_fed: bool,
    /// Watchdog input pin level after this cycle.
    pub wdi_level: bool,
}

#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    cfg: SupervisorConfig,
    bus: BusMonitor,
    wdi_level: bool,
    last: SafetyReport,
}

impl SafetySupervisor {
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            bus: BusMonitor::new(),
            wdi_level: false,
            last: SafetyReport::default(),
        }
    }

    pub fn step(&mut self, inputs: &SupervisorInputs) -> SafetyReport {
        let mut mask = inputs.flags.to_mask();
        mask.set(
            FaultMask::SELF_TEST,
            inputs.self_test == SelfTestResult::Fail,
        );

        let bus_loss = self
            .bus
            .step(inputs.bus_state, inputs.rx_activity, &self.cfg);
        mask.set(FaultMask::BUS_LOSS, bus_loss);

        let status = derive_status(mask, inputs.emergency_stop);

        let feed = !mask.has_critical()
            && inputs.mode != Mode::Shutdown
            && inputs.self_test != SelfTestResult::Fail
            && inputs.bus_state != BusErrorState::BusOff;
        if feed {
            self.wdi_level = !self.wdi_level;
        } else {
            mask |= FaultMask::WATCHDOG;
        }

        if feed != self.last.watchdog_fed {
            if feed {
                info!("watchdog feed resumed");
            } else {
                warn!(mask = mask.bits(), mode = ?inputs.mode, "watchdog feed withheld");
            }
        }

        self.last = SafetyReport {
            mask,
            status,
            bus_loss,
            force_enables_low: bus_loss,
            watchdog_fed: feed,
            wdi_level: self.wdi_level,
        };
        self.last
    }

    pub fn report(&self, sink: &mut dyn DiagnosticSink) {
        sink.report(
            DiagEventId::BusLoss,
            EventStatus::from_failed(self.last.bus_loss),
        );
        sink.report(
            DiagEventId::WatchdogFail,
            EventStatus::from_failed(!self.last.watchdog_fed),
        );
    }

    #[inline]
    pub const fn last_report(&self) -> &SafetyReport {
        &self.last
    }

    #[inline]
    pub const fn bus(&self) -> &BusMonitor {
        &self.bus
    }
}

/// Status from a freshly built mask (before the WATCHDOG bit is added).
pub fn derive_status(mask: FaultMask, emergency_stop: bool) -> SafetyStatus {
    if mask.has_critical() || emergency_stop {
        SafetyStatus::Fault
    } else if !mask.is_empty() {
        SafetyStatus::Degraded
    } else {
        SafetyStatus::Ok
    }
}
