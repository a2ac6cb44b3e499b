//! Prelude module for common re-exports.
//!
//! ```rust
//! use zone_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::zone::config::{
    BrakeConfig, CurrentConfig, DebounceConfig, E2eConfig, MotorConfig, SteeringConfig,
    SupervisorConfig, WatchdogConfig, ZoneConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CONTROL_PERIOD_MS, FRAME_LEN};

// ─── State & Faults ─────────────────────────────────────────────────
pub use crate::zone::diag::{DiagEventId, EventStatus};
pub use crate::zone::error::{BrakeFault, FaultMask, MotorFault, SteeringFault};
pub use crate::zone::state::{
    BusErrorState, DisableLevel, Direction, Mode, SafetyStatus, SelfTestResult,
};
