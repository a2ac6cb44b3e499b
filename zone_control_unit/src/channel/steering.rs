//! Steering servo channel.
//!
//! Per cycle, in order:
//! 1. feedback read failure → immediate fault
//! 2. commanded angle outside `[min_angle_deg, max_angle_deg]` → fault
//! 3. `|previous output − feedback| >= threshold` for `plausibility_debounce` cycles → fault
//! 4. command watchdog; while stale the target walks back toward 0°
//! 5. rate limit on increasing magnitude
//! 6. any fault except a stale command latches and forces 0°
//! 7. angle → servo pulse
//! 8. disable escalation by fault episode count
//!
//! Angles are tenths of a degree internally; commands and feedback arrive in
//! whole degrees.

use tracing::{info, warn};
use zone_common::consts::STEER_ANGLE_SCALE;
use zone_common::zone::config::{SteeringConfig, WatchdogConfig};
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::SteeringFault;
use zone_common::zone::state::DisableLevel;

use super::Feedback;
use crate::command::watchdog::CommandWatchdog;
use crate::diag::DiagnosticSink;
use crate::fault::debounce::{ConfirmCounter, FaultLatch};

/// Per-cycle steering inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteeringInputs {
    /// Commanded angle [deg].
    pub command_deg: i16,
    /// Measured angle [deg].
    pub feedback_deg: Feedback<i16>,
}

/// Per-cycle steering outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SteeringOutputs {
    /// Output angle [0.1 deg].
    pub angle10: i16,
    /// Servo pulse width [µs].
    pub pwm_us: u16,
    pub fault: SteeringFault,
    pub latched: bool,
    /// Command stale, returning to center.
    pub timed_out: bool,
    pub disable_level: DisableLevel,
    /// Primary driver enable line. Low = disabled.
    pub enable_primary: bool,
    /// Secondary driver enable line. Low = disabled.
    pub enable_secondary: bool,
}

#[derive(Debug, Clone)]
pub struct SteeringChannel {
    cfg: SteeringConfig,
    watchdog_cfg: WatchdogConfig,
    watchdog: CommandWatchdog<i16>,
    plausibility: ConfirmCounter,
    latch: FaultLatch,
    /// Last output, also the rate limiter's memory.
    angle10: i16,
    episodes: u16,
    disable_level: DisableLevel,
    last: SteeringOutputs,
}

impl SteeringChannel {
    pub fn new(cfg: SteeringConfig) -> Self {
        let watchdog_cfg = cfg.watchdog();
        let mut channel = Self {
            cfg,
            watchdog_cfg,
            watchdog: CommandWatchdog::new(),
            plausibility: ConfirmCounter::new(),
            latch: FaultLatch::new(),
            angle10: 0,
            episodes: 0,
            disable_level: DisableLevel::None,
            last: SteeringOutputs::default(),
        };
        channel.last = channel.outputs(SteeringFault::None, false);
        channel
    }

    /// Run one control cycle.
    pub fn step(&mut self, inputs: &SteeringInputs) -> SteeringOutputs {
        let cmd = inputs.command_deg;
        let mut fault = SteeringFault::None;

        // ── Feedback ──
        let feedback = match inputs.feedback_deg {
            Ok(deg) => Some(deg),
            Err(_) => {
                fault = SteeringFault::ReadFail;
                None
            }
        };

        // ── Range ──
        if fault == SteeringFault::None
            && (cmd < self.cfg.min_angle_deg || cmd > self.cfg.max_angle_deg)
        {
            fault = SteeringFault::OutOfRange;
        }

        // ── Plausibility ──
        if let (SteeringFault::None, Some(actual)) = (fault, feedback) {
            let output_deg = self.angle10 / STEER_ANGLE_SCALE;
            let mismatch = (output_deg as i32 - actual as i32).unsigned_abs()
                >= self.cfg.plausibility_threshold_deg as u32;
            if self
                .plausibility
                .update(mismatch, self.cfg.plausibility_debounce)
            {
                fault = SteeringFault::Plausibility;
            }
        }

        // ── Command timeout ──
        let timed_out = self.watchdog.evaluate(cmd, &self.watchdog_cfg);
        if timed_out && fault == SteeringFault::None {
            fault = SteeringFault::CmdTimeout;
        }

        // ── Target + rate limit ──
        let target10 = if timed_out {
            return_to_center(self.angle10, self.cfg.return_to_center_step())
        } else {
            cmd.saturating_mul(STEER_ANGLE_SCALE)
        };
        let mut output10 = rate_limit(self.angle10, target10, self.cfg.rate_limit);

        // ── Latch ──
        let mut reported = fault;
        if fault.latches() {
            if self.latch.set() {
                self.episodes = self.episodes.saturating_add(1);
                warn!(
                    fault = ?fault,
                    episode = self.episodes,
                    "steering fault latched"
                );
            }
            output10 = 0;
        } else if self.latch.is_latched() {
            if self.latch.tick_clear(self.cfg.latch_clear_cycles) {
                info!(episodes = self.episodes, "steering latch cleared");
                reported = SteeringFault::None;
            } else {
                output10 = 0;
            }
        }

        self.angle10 = output10;
        if self.latch.is_latched() {
            self.disable_level = DisableLevel::from_episodes(self.episodes);
        }

        self.last = self.outputs(reported, timed_out);
        self.last
    }

    fn outputs(&self, fault: SteeringFault, timed_out: bool) -> SteeringOutputs {
        let latched = self.latch.is_latched();
        let pwm_us = if latched && self.disable_level > DisableLevel::None {
            self.cfg.pwm_center_us
        } else {
            self.angle_to_pwm(self.angle10)
        };
        SteeringOutputs {
            angle10: self.angle10,
            pwm_us,
            fault,
            latched,
            timed_out,
            disable_level: self.disable_level,
            enable_primary: !(latched && self.disable_level.drives_primary_disable()),
            enable_secondary: !(latched && self.disable_level.drives_secondary_disable()),
        }
    }

    /// Linear map of `angle10` onto the servo pulse range, truncating.
    ///
    /// Total for any config: a range that does not straddle zero is widened
    /// to at least 0.1° each side.
    pub fn angle_to_pwm(&self, angle10: i16) -> u16 {
        let min10 = (self.cfg.min_angle10() as i32).min(-1);
        let max10 = (self.cfg.max_angle10() as i32).max(1);
        let pwm_lo = self.cfg.pwm_min_us.min(self.cfg.pwm_max_us) as i32;
        let pwm_hi = self.cfg.pwm_min_us.max(self.cfg.pwm_max_us) as i32;
        let center = self.cfg.pwm_center_us as i32;
        let angle = (angle10 as i32).clamp(min10, max10);

        let offset = if angle >= 0 {
            angle * (self.cfg.pwm_max_us as i32 - center) / max10
        } else {
            angle * (center - self.cfg.pwm_min_us as i32) / -min10
        };
        (center + offset).clamp(pwm_lo, pwm_hi) as u16
    }

    /// Report this cycle's diagnostic status.
    ///
    /// Sensor, range and plausibility events hold their FAILED state for the
    /// whole latch.
    pub fn report(&self, sink: &mut dyn DiagnosticSink) {
        let out = &self.last;
        let mut latched_event = |event: DiagEventId, code: SteeringFault| {
            if out.fault == code {
                sink.report(event, EventStatus::Failed);
            } else if !out.latched {
                sink.report(event, EventStatus::Passed);
            }
        };
        latched_event(DiagEventId::SteerPlausibility, SteeringFault::Plausibility);
        latched_event(DiagEventId::SteerRange, SteeringFault::OutOfRange);
        latched_event(DiagEventId::SteerSensor, SteeringFault::ReadFail);
        sink.report(
            DiagEventId::SteerTimeout,
            EventStatus::from_failed(out.timed_out),
        );
    }

    #[inline]
    pub const fn last_outputs(&self) -> &SteeringOutputs {
        &self.last
    }

    #[inline]
    pub const fn is_latched(&self) -> bool {
        self.latch.is_latched()
    }

    #[inline]
    pub const fn episodes(&self) -> u16 {
        self.episodes
    }
}

/// Limit increasing-magnitude motion to `max_step` tenths per cycle.
///
/// Any step that reduces magnitude passes unchanged.
pub fn rate_limit(previous10: i16, target10: i16, max_step: u16) -> i16 {
    let step = max_step as i32;
    let diff = target10 as i32 - previous10 as i32;
    if diff.abs() <= step || target10.unsigned_abs() < previous10.unsigned_abs() {
        target10
    } else if diff > 0 {
        (previous10 as i32 + step) as i16
    } else {
        (previous10 as i32 - step) as i16
    }
}

/// One return-to-center step, snapping to 0 within one step.
pub fn return_to_center(current10: i16, step10: i16) -> i16 {
    if current10 > step10 {
        current10 - step10
    } else if current10 < -step10 {
        current10 + step10
    } else {
        0
    }
}
