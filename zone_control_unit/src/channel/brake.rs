//! Brake servo channel.
//!
//! Safe value is full brake. Emergency stop, feedback loss, a stale command
//! and a debounced command/feedback deviation all latch. Every new latch
//! episode also asks the motor channel to cut off for `cutoff_repeat` cycles,
//! and the cutoff stays asserted for as long as the latch holds.
//!
//! While the mode engages the brake the output is full brake regardless of
//! the bus command, and the command watchdog is not run.

use tracing::{info, warn};
use zone_common::consts::{DUTY_HW_SCALE, PERCENT_FULL};
use zone_common::zone::config::{BrakeConfig, WatchdogConfig};
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::BrakeFault;

use super::Feedback;
use crate::command::watchdog::CommandWatchdog;
use crate::diag::DiagnosticSink;
use crate::fault::debounce::{ConfirmCounter, FaultLatch};

/// Brake output while any safe reaction is active [%].
pub const BRAKE_SAFE_PCT: u8 = PERCENT_FULL;

/// Per-cycle brake inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrakeInputs {
    /// Commanded brake force [%]; values above 100 are clamped.
    pub command_pct: u8,
    /// Measured brake position [%].
    pub feedback_pct: Feedback<u8>,
    pub emergency_stop: bool,
    /// Brake engaged by the current mode's actions.
    pub engaged: bool,
}

/// Per-cycle brake outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrakeOutputs {
    pub brake_pct: u8,
    pub duty_hw: u16,
    pub fault: BrakeFault,
    pub latched: bool,
    pub timed_out: bool,
    /// Request the motor channel to disable its output.
    pub motor_cutoff: bool,
}

#[derive(Debug, Clone)]
pub struct BrakeChannel {
    cfg: BrakeConfig,
    watchdog_cfg: WatchdogConfig,
    watchdog: CommandWatchdog<u8>,
    deviation: ConfirmCounter,
    latch: FaultLatch,
    cutoff_remaining: u16,
    output_pct: u8,
    last: BrakeOutputs,
}

impl BrakeChannel {
    pub fn new(cfg: BrakeConfig) -> Self {
        let watchdog_cfg = cfg.watchdog();
        Self {
            cfg,
            watchdog_cfg,
            watchdog: CommandWatchdog::new(),
            deviation: ConfirmCounter::new(),
            latch: FaultLatch::new(),
            cutoff_remaining: 0,
            output_pct: 0,
            last: BrakeOutputs::default(),
        }
    }

    pub fn step(&mut self, inputs: &BrakeInputs) -> BrakeOutputs {
        let cmd = inputs.command_pct.min(PERCENT_FULL);
        let timed_out = !inputs.engaged && self.watchdog.evaluate(cmd, &self.watchdog_cfg);

        let fault = if inputs.emergency_stop {
            BrakeFault::EmergencyStop
        } else {
            match inputs.feedback_pct {
                Err(_) => BrakeFault::ReadFail,
                Ok(_) if timed_out => BrakeFault::CmdTimeout,
                Ok(actual) => {
                    let deviates =
                        self.output_pct.abs_diff(actual) > self.cfg.deviation_threshold_pct;
                    if self.deviation.update(deviates, self.cfg.deviation_debounce) {
                        BrakeFault::PwmDeviation
                    } else {
                        BrakeFault::None
                    }
                }
            }
        };

        let mut reported = fault;
        if fault != BrakeFault::None {
            if self.latch.set() {
                self.cutoff_remaining = self.cfg.cutoff_repeat;
                warn!(fault = ?fault, "brake fault latched, motor cutoff requested");
            }
        } else if self.latch.is_latched() {
            if self.latch.tick_clear(self.cfg.latch_clear_cycles) {
                info!("brake latch cleared");
            } else {
                reported = BrakeFault::Latched;
            }
        }

        let latched = self.latch.is_latched();
        self.output_pct = if latched || inputs.engaged {
            BRAKE_SAFE_PCT
        } else {
            cmd
        };

        let motor_cutoff = self.cutoff_remaining > 0 || latched;
        self.cutoff_remaining = self.cutoff_remaining.saturating_sub(1);

        self.last = BrakeOutputs {
            brake_pct: self.output_pct,
            duty_hw: (self.output_pct as u32 * DUTY_HW_SCALE as u32 / PERCENT_FULL as u32) as u16,
            fault: reported,
            latched,
            timed_out,
            motor_cutoff,
        };
        self.last
    }

    pub fn report(&self, sink: &mut dyn DiagnosticSink) {
        let out = &self.last;
        let mut latched_event = |event: DiagEventId, code: BrakeFault| {
            if out.fault == code {
                sink.report(event, EventStatus::Failed);
            } else if !out.latched {
                sink.report(event, EventStatus::Passed);
            }
        };
        latched_event(DiagEventId::BrakeDeviation, BrakeFault::PwmDeviation);
        latched_event(DiagEventId::BrakeSensor, BrakeFault::ReadFail);
        sink.report(
            DiagEventId::BrakeTimeout,
            EventStatus::from_failed(out.timed_out),
        );
    }

    #[inline]
    pub const fn last_outputs(&self) -> &BrakeOutputs {
        &self.last
    }

    #[inline]
    pub const fn is_latched(&self) -> bool {
        self.latch.is_latched()
    }
}
