//! Tuning parameters for the zone controller.
//!
//! All values are integers in cycle counts or fixed-point units; nothing here
//! is floating point. Every struct carries `#[serde(default)]` so a missing
//! section or field falls back to the `*_DEFAULT` constants below.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{CONTROL_PERIOD_MS, PERCENT_FULL, STEER_ANGLE_SCALE};
use crate::zone::state::Mode;

// ─── Defaults ───────────────────────────────────────────────────────

pub const STEER_MIN_ANGLE_DEG_DEFAULT: i16 = -45;
pub const STEER_MAX_ANGLE_DEG_DEFAULT: i16 = 45;
pub const STEER_PWM_MIN_US_DEFAULT: u16 = 1000;
pub const STEER_PWM_CENTER_US_DEFAULT: u16 = 1500;
pub const STEER_PWM_MAX_US_DEFAULT: u16 = 2000;
pub const STEER_PLAUS_THRESHOLD_DEG_DEFAULT: u16 = 5;
pub const STEER_PLAUS_DEBOUNCE_DEFAULT: u16 = 5;
/// Tenths of a degree per cycle.
pub const STEER_RATE_LIMIT_DEFAULT: u16 = 3;
pub const STEER_RTC_RATE_DEG_S_DEFAULT: u16 = 30;
pub const STEER_TIMEOUT_CYCLES_DEFAULT: u16 = 10;
pub const STEER_RECOVERY_COUNT_DEFAULT: u16 = 1;

pub const MOTOR_AUTHORITY_RUN_PCT_DEFAULT: u8 = 100;
pub const MOTOR_AUTHORITY_DEGRADED_PCT_DEFAULT: u8 = 75;
pub const MOTOR_MAX_DUTY_PCT_DEFAULT: u8 = 95;
pub const MOTOR_TIMEOUT_CYCLES_DEFAULT: u16 = 10;
pub const MOTOR_RECOVERY_COUNT_DEFAULT: u16 = 5;

pub const BRAKE_DEVIATION_PCT_DEFAULT: u8 = 2;
pub const BRAKE_DEVIATION_DEBOUNCE_DEFAULT: u16 = 3;
pub const BRAKE_CUTOFF_REPEAT_DEFAULT: u16 = 10;
pub const BRAKE_TIMEOUT_CYCLES_DEFAULT: u16 = 9;
pub const BRAKE_RECOVERY_COUNT_DEFAULT: u16 = 1;

pub const LATCH_CLEAR_CYCLES_DEFAULT: u16 = 50;

pub const OVERCURRENT_THRESHOLD_MA_DEFAULT: u32 = 25_000;
/// 1 ms samples.
pub const OVERCURRENT_CONFIRM_DEFAULT: u16 = 10;
/// 1 ms samples.
pub const OVERCURRENT_RECOVERY_DEFAULT: u16 = 500;

pub const BUS_SILENCE_CYCLES_DEFAULT: u16 = 20;
pub const BUS_WARNING_CYCLES_DEFAULT: u16 = 50;

pub const E2E_FAIL_LIMIT_DEFAULT: u8 = 3;
pub const E2E_TORQUE_DATA_ID_DEFAULT: u8 = 0x11;
pub const E2E_STEER_DATA_ID_DEFAULT: u8 = 0x12;
pub const E2E_BRAKE_DATA_ID_DEFAULT: u8 = 0x13;
pub const E2E_STATUS_DATA_ID_DEFAULT: u8 = 0x20;

// ─── Shared Primitives ──────────────────────────────────────────────

/// Confirm / clear thresholds for a debounced, latched fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Consecutive faulty cycles before the fault is confirmed.
    pub confirm_threshold: u16,
    /// Consecutive fault-free cycles before the latch clears.
    pub clear_threshold: u16,
}

impl DebounceConfig {
    pub const fn new(confirm_threshold: u16, clear_threshold: u16) -> Self {
        Self {
            confirm_threshold,
            clear_threshold,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.confirm_threshold == 0 || self.clear_threshold == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{name}: debounce thresholds must be non-zero"
            )));
        }
        Ok(())
    }
}

/// Timeout / recovery thresholds for a command watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Consecutive unchanged cycles before the command is considered stale.
    pub timeout_cycles: u16,
    /// Changed values required to leave the timed-out state.
    pub recovery_count: u16,
}

impl WatchdogConfig {
    pub const fn new(timeout_cycles: u16, recovery_count: u16) -> Self {
        Self {
            timeout_cycles,
            recovery_count,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.timeout_cycles == 0 || self.recovery_count == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{name}: timeout_cycles and recovery_count must be non-zero"
            )));
        }
        Ok(())
    }
}

// ─── Steering ───────────────────────────────────────────────────────

/// Steering servo channel parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Lowest accepted commanded angle [deg].
    pub min_angle_deg: i16,
    /// Highest accepted commanded angle [deg].
    pub max_angle_deg: i16,
    /// Servo pulse at `min_angle_deg` [µs].
    pub pwm_min_us: u16,
    /// Servo pulse at 0° [µs].
    pub pwm_center_us: u16,
    /// Servo pulse at `max_angle_deg` [µs].
    pub pwm_max_us: u16,
    /// Output/feedback disagreement that counts as implausible [deg].
    pub plausibility_threshold_deg: u16,
    /// Consecutive implausible cycles before the fault is confirmed.
    pub plausibility_debounce: u16,
    /// Max magnitude increase per cycle [0.1 deg].
    pub rate_limit: u16,
    /// Return-to-center speed while the command is stale [deg/s].
    pub return_to_center_deg_s: u16,
    pub latch_clear_cycles: u16,
    pub timeout_cycles: u16,
    pub recovery_count: u16,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            min_angle_deg: STEER_MIN_ANGLE_DEG_DEFAULT,
            max_angle_deg: STEER_MAX_ANGLE_DEG_DEFAULT,
            pwm_min_us: STEER_PWM_MIN_US_DEFAULT,
            pwm_center_us: STEER_PWM_CENTER_US_DEFAULT,
            pwm_max_us: STEER_PWM_MAX_US_DEFAULT,
            plausibility_threshold_deg: STEER_PLAUS_THRESHOLD_DEG_DEFAULT,
            plausibility_debounce: STEER_PLAUS_DEBOUNCE_DEFAULT,
            rate_limit: STEER_RATE_LIMIT_DEFAULT,
            return_to_center_deg_s: STEER_RTC_RATE_DEG_S_DEFAULT,
            latch_clear_cycles: LATCH_CLEAR_CYCLES_DEFAULT,
            timeout_cycles: STEER_TIMEOUT_CYCLES_DEFAULT,
            recovery_count: STEER_RECOVERY_COUNT_DEFAULT,
        }
    }
}

impl SteeringConfig {
    /// Lower angle bound in tenths of a degree.
    #[inline]
    pub const fn min_angle10(&self) -> i16 {
        self.min_angle_deg * STEER_ANGLE_SCALE
    }

    /// Upper angle bound in tenths of a degree.
    #[inline]
    pub const fn max_angle10(&self) -> i16 {
        self.max_angle_deg * STEER_ANGLE_SCALE
    }

    /// Return-to-center step per cycle in tenths of a degree, at least 1.
    pub const fn return_to_center_step(&self) -> i16 {
        let step = (self.return_to_center_deg_s as u32 * STEER_ANGLE_SCALE as u32
            * CONTROL_PERIOD_MS)
            / 1000;
        if step == 0 { 1 } else { step as i16 }
    }

    pub const fn watchdog(&self) -> WatchdogConfig {
        WatchdogConfig::new(self.timeout_cycles, self.recovery_count)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_angle_deg >= 0 || self.max_angle_deg <= 0 {
            return Err(ConfigError::ValidationError(
                "steering: angle range must straddle zero".to_string(),
            ));
        }
        if self.min_angle_deg < -300 || self.max_angle_deg > 300 {
            return Err(ConfigError::ValidationError(
                "steering: angle range exceeds ±300 deg".to_string(),
            ));
        }
        if !(self.pwm_min_us < self.pwm_center_us && self.pwm_center_us < self.pwm_max_us) {
            return Err(ConfigError::ValidationError(
                "steering: require pwm_min_us < pwm_center_us < pwm_max_us".to_string(),
            ));
        }
        if self.plausibility_debounce == 0 || self.rate_limit == 0 || self.latch_clear_cycles == 0
        {
            return Err(ConfigError::ValidationError(
                "steering: debounce, rate_limit and latch_clear_cycles must be non-zero"
                    .to_string(),
            ));
        }
        self.watchdog().validate("steering")
    }
}

// ─── Motor ──────────────────────────────────────────────────────────

/// Propulsion motor channel parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Torque authority in RUN [%].
    pub authority_run_pct: u8,
    /// Torque authority in DEGRADED [%].
    pub authority_degraded_pct: u8,
    /// Hard duty ceiling, kept below 100 % for the bootstrap supply.
    pub max_duty_pct: u8,
    pub timeout_cycles: u16,
    pub recovery_count: u16,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            authority_run_pct: MOTOR_AUTHORITY_RUN_PCT_DEFAULT,
            authority_degraded_pct: MOTOR_AUTHORITY_DEGRADED_PCT_DEFAULT,
            max_duty_pct: MOTOR_MAX_DUTY_PCT_DEFAULT,
            timeout_cycles: MOTOR_TIMEOUT_CYCLES_DEFAULT,
            recovery_count: MOTOR_RECOVERY_COUNT_DEFAULT,
        }
    }
}

impl MotorConfig {
    /// Authority limit [%] for `mode`. Modes without authority map to 0.
    pub const fn authority_pct(&self, mode: Mode) -> u8 {
        match mode {
            Mode::Run => self.authority_run_pct,
            Mode::Degraded => self.authority_degraded_pct,
            Mode::Startup | Mode::SafeStop | Mode::Shutdown => 0,
        }
    }

    pub const fn watchdog(&self) -> WatchdogConfig {
        WatchdogConfig::new(self.timeout_cycles, self.recovery_count)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authority_run_pct > PERCENT_FULL || self.authority_degraded_pct > PERCENT_FULL {
            return Err(ConfigError::ValidationError(
                "motor: authority percentages must be <= 100".to_string(),
            ));
        }
        if self.max_duty_pct == 0 || self.max_duty_pct >= PERCENT_FULL {
            return Err(ConfigError::ValidationError(
                "motor: max_duty_pct must be in 1..100".to_string(),
            ));
        }
        self.watchdog().validate("motor")
    }
}

// ─── Brake ──────────────────────────────────────────────────────────

/// Brake servo channel parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeConfig {
    /// Allowed command/feedback deviation [%].
    pub deviation_threshold_pct: u8,
    pub deviation_debounce: u16,
    /// Cycles the motor-cutoff request is held after a fault.
    pub cutoff_repeat: u16,
    pub latch_clear_cycles: u16,
    pub timeout_cycles: u16,
    pub recovery_count: u16,
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self {
            deviation_threshold_pct: BRAKE_DEVIATION_PCT_DEFAULT,
            deviation_debounce: BRAKE_DEVIATION_DEBOUNCE_DEFAULT,
            cutoff_repeat: BRAKE_CUTOFF_REPEAT_DEFAULT,
            latch_clear_cycles: LATCH_CLEAR_CYCLES_DEFAULT,
            timeout_cycles: BRAKE_TIMEOUT_CYCLES_DEFAULT,
            recovery_count: BRAKE_RECOVERY_COUNT_DEFAULT,
        }
    }
}

impl BrakeConfig {
    pub const fn debounce(&self) -> DebounceConfig {
        DebounceConfig::new(self.deviation_debounce, self.latch_clear_cycles)
    }

    pub const fn watchdog(&self) -> WatchdogConfig {
        WatchdogConfig::new(self.timeout_cycles, self.recovery_count)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deviation_threshold_pct > PERCENT_FULL {
            return Err(ConfigError::ValidationError(
                "brake: deviation_threshold_pct must be <= 100".to_string(),
            ));
        }
        self.debounce().validate("brake")?;
        self.watchdog().validate("brake")
    }
}

// ─── Current Monitor ────────────────────────────────────────────────

/// Overcurrent monitor parameters (1 ms samples).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConfig {
    pub threshold_ma: u32,
    pub confirm_samples: u16,
    pub recovery_samples: u16,
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            threshold_ma: OVERCURRENT_THRESHOLD_MA_DEFAULT,
            confirm_samples: OVERCURRENT_CONFIRM_DEFAULT,
            recovery_samples: OVERCURRENT_RECOVERY_DEFAULT,
        }
    }
}

impl CurrentConfig {
    pub const fn debounce(&self) -> DebounceConfig {
        DebounceConfig::new(self.confirm_samples, self.recovery_samples)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold_ma == 0 {
            return Err(ConfigError::ValidationError(
                "current: threshold_ma must be non-zero".to_string(),
            ));
        }
        self.debounce().validate("current")
    }
}

// ─── Supervisor ─────────────────────────────────────────────────────

/// Bus-loss detection thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Cycles without receive activity before bus loss latches.
    pub silence_cycles: u16,
    /// Consecutive cycles in error-warning before bus loss latches.
    pub warning_cycles: u16,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            silence_cycles: BUS_SILENCE_CYCLES_DEFAULT,
            warning_cycles: BUS_WARNING_CYCLES_DEFAULT,
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.silence_cycles == 0 || self.warning_cycles == 0 {
            return Err(ConfigError::ValidationError(
                "supervisor: bus thresholds must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Message Integrity ──────────────────────────────────────────────

/// Per-message data IDs and the substitution threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Consecutive failures after which a command slot is replaced by its safe default.
    pub fail_limit: u8,
    pub torque_data_id: u8,
    pub steer_data_id: u8,
    pub brake_data_id: u8,
    pub status_data_id: u8,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            fail_limit: E2E_FAIL_LIMIT_DEFAULT,
            torque_data_id: E2E_TORQUE_DATA_ID_DEFAULT,
            steer_data_id: E2E_STEER_DATA_ID_DEFAULT,
            brake_data_id: E2E_BRAKE_DATA_ID_DEFAULT,
            status_data_id: E2E_STATUS_DATA_ID_DEFAULT,
        }
    }
}

impl E2eConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fail_limit == 0 {
            return Err(ConfigError::ValidationError(
                "e2e: fail_limit must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Top-Level ──────────────────────────────────────────────────────

/// Complete zone-controller configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "rear-zone"
///
/// [steering]
/// max_angle_deg = 40
///
/// [motor]
/// authority_degraded_pct = 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub shared: SharedConfig,
    pub steering: SteeringConfig,
    pub motor: MotorConfig,
    pub brake: BrakeConfig,
    pub current: CurrentConfig,
    pub supervisor: SupervisorConfig,
    pub e2e: E2eConfig,
}

impl ZoneConfig {
    /// Validate every section, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.steering.validate()?;
        self.motor.validate()?;
        self.brake.validate()?;
        self.current.validate()?;
        self.supervisor.validate()?;
        self.e2e.validate()
    }
}
