//! Bus-loss detection.
//!
//! Three independent paths latch bus loss:
//! - transport reports bus-off
//! - no receive activity for `silence_cycles`
//! - error-warning state held for `warning_cycles`
//!
//! The latch is never cleared; only a fresh monitor starts unlatched.

use tracing::warn;
use zone_common::zone::config::SupervisorConfig;
use zone_common::zone::state::BusErrorState;

/// Path that latched the bus loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusLossCause {
    BusOff,
    Silence,
    ErrorWarning,
}

#[derive(Debug, Clone, Default)]
pub struct BusMonitor {
    silence_cycles: u16,
    warning_cycles: u16,
    cause: Option<BusLossCause>,
}

impl BusMonitor {
    pub const fn new() -> Self {
        Self {
            silence_cycles: 0,
            warning_cycles: 0,
            cause: None,
        }
    }

    /// Observe one cycle. Returns the latched bus-loss state.
    ///
    /// `rx_activity` is the external reset signal for the silence counter.
    pub fn step(
        &mut self,
        state: BusErrorState,
        rx_activity: bool,
        cfg: &SupervisorConfig,
    ) -> bool {
        if state == BusErrorState::BusOff {
            self.latch(BusLossCause::BusOff);
        }

        self.silence_cycles = if rx_activity {
            0
        } else {
            self.silence_cycles.saturating_add(1)
        };
        if self.silence_cycles >= cfg.silence_cycles {
            self.latch(BusLossCause::Silence);
        }

        if state == BusErrorState::Warning {
            self.warning_cycles = self.warning_cycles.saturating_add(1);
            if self.warning_cycles >= cfg.warning_cycles {
                self.latch(BusLossCause::ErrorWarning);
            }
        } else {
            self.warning_cycles = 0;
        }

        self.is_lost()
    }

    fn latch(&mut self, cause: BusLossCause) {
        if self.cause.is_none() {
            warn!(?cause, "bus loss latched");
            self.cause = Some(cause);
        }
    }

    #[inline]
    pub const fn is_lost(&self) -> bool {
        self.cause.is_some()
    }

    /// First path that latched, if any.
    #[inline]
    pub const fn cause(&self) -> Option<BusLossCause> {
        self.cause
    }

    #[inline]
    pub const fn silence_cycles(&self) -> u16 {
        self.silence_cycles
    }

    #[inline]
    pub const fn warning_cycles(&self) -> u16 {
        self.warning_cycles
    }
}
