//! Propulsion motor channel driving a half-bridge (BTS7960 style: one PWM and
//! one enable per bridge half).
//!
//! Torque is a signed percentage. Limiting order: early disable → SAFE_STOP
//! zero → mode authority → thermal derate → command watchdog → overcurrent.
//! The result selects a direction; reversals pass through one dead-time cycle
//! before the new half is driven.

use tracing::{error, info, warn};
use zone_common::consts::{DUTY_HW_SCALE, PERCENT_FULL};
use zone_common::zone::config::{MotorConfig, WatchdogConfig};
use zone_common::zone::diag::{DiagEventId, EventStatus};
use zone_common::zone::error::MotorFault;
use zone_common::zone::state::{Direction, Mode};

use crate::command::watchdog::CommandWatchdog;
use crate::diag::DiagnosticSink;

const TORQUE_LIMIT: i16 = PERCENT_FULL as i16;

/// Per-cycle motor inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorInputs {
    /// Raw torque command [%], sign = direction.
    pub torque_cmd: i16,
    pub emergency_stop: bool,
    /// Cutoff requested by the brake channel.
    pub brake_cutoff: bool,
    /// Thermal derating [%], 100 = none.
    pub derate_pct: u8,
    /// Current monitor latch state.
    pub overcurrent: bool,
}

impl Default for MotorInputs {
    fn default() -> Self {
        Self {
            torque_cmd: 0,
            emergency_stop: false,
            brake_cutoff: false,
            derate_pct: PERCENT_FULL,
            overcurrent: false,
        }
    }
}

/// PWM duty on each bridge half [0..DUTY_HW_SCALE].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeDrive {
    pub rpwm: u16,
    pub lpwm: u16,
}

impl BridgeDrive {
    pub const OFF: Self = Self { rpwm: 0, lpwm: 0 };

    fn for_direction(direction: Direction, duty_hw: u16) -> Self {
        match direction {
            Direction::Forward => Self {
                rpwm: duty_hw,
                lpwm: 0,
            },
            Direction::Reverse => Self {
                rpwm: 0,
                lpwm: duty_hw,
            },
            Direction::Stop => Self::OFF,
        }
    }

    /// Both halves driven at once: cross-conduction.
    #[inline]
    const fn is_shoot_through(&self) -> bool {
        self.rpwm > 0 && self.lpwm > 0
    }
}

/// Per-cycle motor outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorOutputs {
    /// Effective torque after all limits [%].
    pub torque: i16,
    pub direction: Direction,
    pub duty_pct: u8,
    pub duty_hw: u16,
    pub bridge: BridgeDrive,
    /// Right-half enable (R_EN).
    pub r_en: bool,
    /// Left-half enable (L_EN).
    pub l_en: bool,
    pub fault: MotorFault,
    /// Overcurrent or terminal latch active.
    pub latched: bool,
    pub timed_out: bool,
    /// Output held off for dead-time this cycle.
    pub dead_time: bool,
}

#[derive(Debug, Clone)]
pub struct MotorChannel {
    cfg: MotorConfig,
    watchdog_cfg: WatchdogConfig,
    watchdog: CommandWatchdog<i16>,
    direction: Direction,
    /// Set once, cleared only by re-creating the channel.
    terminal: bool,
    last: MotorOutputs,
}

impl MotorChannel {
    pub fn new(cfg: MotorConfig) -> Self {
        let watchdog_cfg = cfg.watchdog();
        Self {
            cfg,
            watchdog_cfg,
            watchdog: CommandWatchdog::new(),
            direction: Direction::Stop,
            terminal: false,
            last: MotorOutputs::default(),
        }
    }

    /// Run one control cycle with the mode left by the previous arbitration.
    pub fn step(&mut self, inputs: &MotorInputs, mode: Mode) -> MotorOutputs {
        // ── Early disable ──
        if inputs.emergency_stop
            || inputs.brake_cutoff
            || matches!(mode, Mode::Startup | Mode::Shutdown)
        {
            self.direction = Direction::Stop;
            self.last = self.disabled(inputs.overcurrent, self.watchdog.timed_out(), false);
            return self.last;
        }

        // ── Limits ──
        let mut torque = inputs.torque_cmd.clamp(-TORQUE_LIMIT, TORQUE_LIMIT);
        if mode == Mode::SafeStop {
            torque = 0;
        }
        let authority = self.cfg.authority_pct(mode) as i16;
        torque = torque.clamp(-authority, authority);
        let derate = inputs.derate_pct.min(PERCENT_FULL) as i32;
        torque = (torque as i32 * derate / PERCENT_FULL as i32) as i16;

        // ── Command timeout ──
        let was_timed_out = self.watchdog.timed_out();
        let timed_out = self.watchdog.evaluate(inputs.torque_cmd, &self.watchdog_cfg);
        if timed_out != was_timed_out {
            if timed_out {
                warn!(cmd = inputs.torque_cmd, "motor command timed out");
            } else {
                info!("motor command recovered");
            }
        }
        torque = self.watchdog.effective(torque, 0);

        if inputs.overcurrent || self.terminal {
            self.direction = Direction::Stop;
            self.last = self.disabled(inputs.overcurrent, timed_out, false);
            return self.last;
        }

        // ── Direction + dead-time ──
        let requested = Direction::from_torque(torque);
        if self.direction.is_reversal(requested) {
            self.direction = Direction::Stop;
            self.last = self.disabled(false, timed_out, true);
            return self.last;
        }
        self.direction = requested;

        // ── Duty ──
        let max_duty = self.cfg.max_duty_pct as u32;
        let duty_pct = (torque.unsigned_abs() as u32 * max_duty / PERCENT_FULL as u32).min(max_duty);
        let duty_hw = (duty_pct * DUTY_HW_SCALE as u32 / PERCENT_FULL as u32) as u16;
        let bridge = BridgeDrive::for_direction(requested, duty_hw);

        if self.verify_bridge(&bridge) {
            self.last = self.disabled(false, timed_out, false);
            return self.last;
        }

        let enable = requested != Direction::Stop && duty_hw > 0;
        self.last = MotorOutputs {
            torque,
            direction: requested,
            duty_pct: duty_pct as u8,
            duty_hw,
            bridge,
            r_en: enable,
            l_en: enable,
            fault: if timed_out {
                MotorFault::CmdTimeout
            } else {
                MotorFault::None
            },
            latched: false,
            timed_out,
            dead_time: false,
        };
        self.last
    }

    /// Latch the terminal fault on cross-conduction. Returns `true` if latched.
    fn verify_bridge(&mut self, bridge: &BridgeDrive) -> bool {
        if bridge.is_shoot_through() && !self.terminal {
            self.terminal = true;
            self.direction = Direction::Stop;
            error!(
                rpwm = bridge.rpwm,
                lpwm = bridge.lpwm,
                "bridge shoot-through: terminal latch"
            );
        }
        self.terminal
    }

    fn disabled(&self, overcurrent: bool, timed_out: bool, dead_time: bool) -> MotorOutputs {
        let fault = if self.terminal {
            MotorFault::ShootThrough
        } else if overcurrent {
            MotorFault::Overcurrent
        } else if timed_out {
            MotorFault::CmdTimeout
        } else {
            MotorFault::None
        };
        MotorOutputs {
            fault,
            latched: self.terminal || overcurrent,
            timed_out,
            dead_time,
            ..MotorOutputs::default()
        }
    }

    pub fn report(&self, sink: &mut dyn DiagnosticSink) {
        let out = &self.last;
        sink.report(
            DiagEventId::MotorShootThrough,
            EventStatus::from_failed(self.terminal),
        );
        sink.report(
            DiagEventId::MotorOvercurrent,
            EventStatus::from_failed(out.fault == MotorFault::Overcurrent),
        );
        sink.report(
            DiagEventId::MotorTimeout,
            EventStatus::from_failed(out.timed_out),
        );
    }

    #[inline]
    pub const fn last_outputs(&self) -> &MotorOutputs {
        &self.last
    }

    /// Terminal latch active; only a power cycle clears it.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }
}
