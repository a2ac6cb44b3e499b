//! Overcurrent monitor, sampled every 1 ms.
//!
//! A sample above `threshold_ma` counts toward confirmation; once latched,
//! `recovery_samples` consecutive samples at or below the threshold clear it.
//! A single spike during recovery restarts the count.

use tracing::{info, warn};
use zone_common::zone::config::{CurrentConfig, DebounceConfig};

use super::debounce::FaultDebouncer;

#[derive(Debug, Clone)]
pub struct CurrentMonitor {
    threshold_ma: u32,
    debounce: DebounceConfig,
    debouncer: FaultDebouncer,
    last_ma: u32,
}

impl CurrentMonitor {
    pub fn new(cfg: &CurrentConfig) -> Self {
        Self {
            threshold_ma: cfg.threshold_ma,
            debounce: cfg.debounce(),
            debouncer: FaultDebouncer::new(),
            last_ma: 0,
        }
    }

    /// Feed one current sample. Returns the latched overcurrent state.
    pub fn sample(&mut self, current_ma: u32) -> bool {
        let was_latched = self.debouncer.is_latched();
        let signal = self
            .debouncer
            .evaluate(current_ma > self.threshold_ma, &self.debounce);
        self.last_ma = current_ma;

        if signal.latched && !was_latched {
            warn!(current_ma, threshold_ma = self.threshold_ma, "overcurrent latched");
        } else if was_latched && !signal.latched {
            info!(current_ma, "overcurrent cleared");
        }
        signal.latched
    }

    #[inline]
    pub const fn is_overcurrent(&self) -> bool {
        self.debouncer.is_latched()
    }

    #[inline]
    pub const fn last_sample_ma(&self) -> u32 {
        self.last_ma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> CurrentMonitor {
        CurrentMonitor::new(&CurrentConfig {
            threshold_ma: 1000,
            confirm_samples: 3,
            recovery_samples: 5,
        })
    }

    #[test]
    fn short_spike_is_ignored() {
        let mut m = monitor();
        assert!(!m.sample(5000));
        assert!(!m.sample(5000));
        assert!(!m.sample(200));
        assert!(!m.sample(5000));
        assert!(!m.is_overcurrent());
    }

    #[test]
    fn threshold_itself_is_not_overcurrent() {
        let mut m = monitor();
        for _ in 0..10 {
            assert!(!m.sample(1000));
        }
    }

    #[test]
    fn spike_during_recovery_restarts_count() {
        let mut m = monitor();
        for _ in 0..3 {
            m.sample(2000);
        }
        assert!(m.is_overcurrent());

        for _ in 0..4 {
            assert!(m.sample(100));
        }
        assert!(m.sample(9000));
        for _ in 0..4 {
            assert!(m.sample(100));
        }
        assert!(!m.sample(100));
        assert_eq!(m.last_sample_ma(), 100);
    }
}
