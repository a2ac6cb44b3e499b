//! System-wide constants for the zone controller.
//!
//! Fixed-point scale factors live here so every conversion names its unit.

/// Period of the channel control / supervision cycle.
pub const CONTROL_PERIOD_MS: u32 = 10;

/// Period of the current-sampling task.
pub const CURRENT_SAMPLE_PERIOD_MS: u32 = 1;

/// Steering angles are held internally in tenths of a degree.
pub const STEER_ANGLE_SCALE: i16 = 10;

/// Percent full scale.
pub const PERCENT_FULL: u8 = 100;

/// Hardware duty resolution: 10000 = 100.00 %.
pub const DUTY_HW_SCALE: u16 = 10_000;

/// Highest escalation level of the steering disable chain.
pub const MAX_DISABLE_LEVEL: u8 = 3;

/// Bus frame length in bytes.
pub const FRAME_LEN: usize = 8;

/// Number of protected message slots (RX commands + TX status).
pub const E2E_SLOT_COUNT: usize = 4;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zone/zone.toml";
