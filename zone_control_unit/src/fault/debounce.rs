//! Debounced, latched fault evaluation.
//!
//! A raw per-cycle condition must hold for `confirm_threshold` consecutive
//! cycles to confirm. A confirmed fault sets a latch that only clears after
//! `clear_threshold` consecutive fault-free cycles. The two counters are also
//! exposed separately because channels with several fault sources share one
//! latch across them.

use zone_common::zone::config::DebounceConfig;

/// Consecutive-cycle counter. Any false cycle resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmCounter {
    count: u16,
}

impl ConfirmCounter {
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    /// Feed one cycle. Returns `true` once `threshold` consecutive true
    /// cycles have been seen, and on every further true cycle.
    #[inline]
    pub fn update(&mut self, condition: bool, threshold: u16) -> bool {
        if condition {
            self.count = self.count.saturating_add(1);
            self.count >= threshold
        } else {
            self.count = 0;
            false
        }
    }

    #[inline]
    pub const fn count(&self) -> u16 {
        self.count
    }

    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Fault latch with fault-free clear counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultLatch {
    latched: bool,
    clear_counter: u16,
}

impl FaultLatch {
    pub const fn new() -> Self {
        Self {
            latched: false,
            clear_counter: 0,
        }
    }

    /// Set the latch and reset the clear counter.
    ///
    /// Returns `true` if the latch was not already set (new episode).
    #[inline]
    pub fn set(&mut self) -> bool {
        let new_episode = !self.latched;
        self.latched = true;
        self.clear_counter = 0;
        new_episode
    }

    /// Count one fault-free cycle. Returns `true` on the cycle the latch clears.
    ///
    /// No effect while not latched.
    #[inline]
    pub fn tick_clear(&mut self, threshold: u16) -> bool {
        if !self.latched {
            return false;
        }
        self.clear_counter = self.clear_counter.saturating_add(1);
        if self.clear_counter >= threshold {
            self.latched = false;
            self.clear_counter = 0;
            true
        } else {
            false
        }
    }

    #[inline]
    pub const fn is_latched(&self) -> bool {
        self.latched
    }

    #[inline]
    pub const fn clear_counter(&self) -> u16 {
        self.clear_counter
    }
}

/// Result of one [`FaultDebouncer::evaluate`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultSignal {
    /// Fault confirmed present this cycle.
    pub confirmed: bool,
    /// Latch state after this cycle.
    pub latched: bool,
}

/// Confirm counter + latch for a single fault source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultDebouncer {
    confirm: ConfirmCounter,
    latch: FaultLatch,
}

impl FaultDebouncer {
    pub const fn new() -> Self {
        Self {
            confirm: ConfirmCounter::new(),
            latch: FaultLatch::new(),
        }
    }

    /// Feed this cycle's raw condition.
    ///
    /// While latched a true condition only resets the clear counter; the
    /// confirm threshold is not re-run.
    pub fn evaluate(&mut self, condition: bool, cfg: &DebounceConfig) -> FaultSignal {
        let confirmed = if !self.latch.is_latched() {
            let confirmed = self.confirm.update(condition, cfg.confirm_threshold);
            if confirmed {
                self.latch.set();
            }
            confirmed
        } else if condition {
            self.latch.set();
            true
        } else {
            if self.latch.tick_clear(cfg.clear_threshold) {
                self.confirm.reset();
            }
            false
        };

        FaultSignal {
            confirmed,
            latched: self.latch.is_latched(),
        }
    }

    #[inline]
    pub const fn is_latched(&self) -> bool {
        self.latch.is_latched()
    }

    #[inline]
    pub const fn confirm_count(&self) -> u16 {
        self.confirm.count()
    }

    #[inline]
    pub const fn clear_counter(&self) -> u16 {
        self.latch.clear_counter()
    }
}
