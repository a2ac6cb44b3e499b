//! Command watchdog.
//!
//! An upstream sender refreshes its command every cycle, so a value that
//! stays bit-identical for `timeout_cycles` is treated as sender loss. Leaving
//! the timed-out state needs `recovery_count` changed values observed while
//! timed out.
//!
//! The previous value starts at `T::default()`. A command that differs from
//! the default is therefore seen as a change on its first cycle, and times out
//! `timeout_cycles` cycles after that.

use zone_common::zone::config::WatchdogConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandWatchdog<T> {
    previous: T,
    timeout_counter: u16,
    recovery_counter: u16,
    timed_out: bool,
}

impl<T: Copy + PartialEq + Default> CommandWatchdog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe this cycle's raw command. Returns the timed-out state.
    pub fn evaluate(&mut self, current: T, cfg: &WatchdogConfig) -> bool {
        if current == self.previous {
            self.timeout_counter = self.timeout_counter.saturating_add(1);
            if !self.timed_out && self.timeout_counter >= cfg.timeout_cycles {
                self.timed_out = true;
                self.recovery_counter = 0;
            }
        } else {
            self.timeout_counter = 0;
            if self.timed_out {
                self.recovery_counter = self.recovery_counter.saturating_add(1);
                if self.recovery_counter >= cfg.recovery_count {
                    self.timed_out = false;
                    self.recovery_counter = 0;
                }
            }
        }

        self.previous = current;
        self.timed_out
    }

    /// `safe` while timed out, otherwise `current`.
    #[inline]
    pub fn effective(&self, current: T, safe: T) -> T {
        if self.timed_out { safe } else { current }
    }

    #[inline]
    pub const fn timed_out(&self) -> bool {
        self.timed_out
    }

    #[inline]
    pub const fn timeout_counter(&self) -> u16 {
        self.timeout_counter
    }

    #[inline]
    pub const fn recovery_counter(&self) -> u16 {
        self.recovery_counter
    }
}
