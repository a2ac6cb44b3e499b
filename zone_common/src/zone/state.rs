//! State enums for the zone controller.
//!
//! All enums use `#[repr(u8)]` so the raw value can be placed directly in a
//! bus frame. `from_u8` is the only decoding path.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

// ─── Operating Mode ─────────────────────────────────────────────────

/// ECU-wide operating mode, ordered by severity.
///
/// Exactly one value is current; only the mode arbiter changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Mode {
    /// Power-up, actuators held off.
    Startup = 0,
    /// Full authority.
    Run = 1,
    /// Reduced authority after a non-critical fault.
    Degraded = 2,
    /// Zero torque, brake applied.
    SafeStop = 3,
    /// Terminal.
    Shutdown = 4,
}

impl Mode {
    /// All modes in ordinal order.
    pub const ALL: [Self; 5] = [
        Self::Startup,
        Self::Run,
        Self::Degraded,
        Self::SafeStop,
        Self::Shutdown,
    ];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Startup),
            1 => Some(Self::Run),
            2 => Some(Self::Degraded),
            3 => Some(Self::SafeStop),
            4 => Some(Self::Shutdown),
            _ => None,
        }
    }

    /// Severity ordinal.
    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Number of modes, used to size per-mode tables.
    pub const COUNT: usize = 5;
}

impl Default for Mode {
    fn default() -> Self {
        Self::Startup
    }
}

// ─── Motor Direction ────────────────────────────────────────────────

/// Half-bridge drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Forward = 0,
    Reverse = 1,
    Stop = 2,
}

impl Direction {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Forward),
            1 => Some(Self::Reverse),
            2 => Some(Self::Stop),
            _ => None,
        }
    }

    /// Direction implied by the sign of a torque value.
    #[inline]
    pub const fn from_torque(torque: i16) -> Self {
        if torque > 0 {
            Self::Forward
        } else if torque < 0 {
            Self::Reverse
        } else {
            Self::Stop
        }
    }

    /// `true` for a change between the two driving directions.
    #[inline]
    pub const fn is_reversal(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Forward, Self::Reverse) | (Self::Reverse, Self::Forward)
        )
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Stop
    }
}

// ─── Health ─────────────────────────────────────────────────────────

/// Three-level safety status derived by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SafetyStatus {
    Ok = 0,
    Degraded = 1,
    Fault = 2,
}

impl SafetyStatus {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Degraded),
            2 => Some(Self::Fault),
            _ => None,
        }
    }
}

impl Default for SafetyStatus {
    fn default() -> Self {
        Self::Ok
    }
}

/// Transport error state reported by the bus controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BusErrorState {
    Active = 0,
    Warning = 1,
    BusOff = 2,
}

impl BusErrorState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Active),
            1 => Some(Self::Warning),
            2 => Some(Self::BusOff),
            _ => None,
        }
    }
}

impl Default for BusErrorState {
    fn default() -> Self {
        Self::Active
    }
}

/// Result of the most recent start-up or periodic self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SelfTestResult {
    Pass = 0,
    Fail = 1,
    NotRun = 2,
}

impl SelfTestResult {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pass),
            1 => Some(Self::Fail),
            2 => Some(Self::NotRun),
            _ => None,
        }
    }
}

impl Default for SelfTestResult {
    fn default() -> Self {
        Self::NotRun
    }
}

// ─── Steering Disable Chain ─────────────────────────────────────────

/// Escalating steering disable level.
///
/// Each level adds one independent hardware action on top of the previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DisableLevel {
    /// Normal output.
    None = 0,
    /// Neutral pulse commanded.
    Neutral = 1,
    /// Neutral pulse + primary disable line.
    PrimaryDisable = 2,
    /// Neutral pulse + both disable lines.
    FullDisable = 3,
}

impl DisableLevel {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Neutral),
            2 => Some(Self::PrimaryDisable),
            3 => Some(Self::FullDisable),
            _ => None,
        }
    }

    /// Level reached after `episodes` distinct fault episodes.
    #[inline]
    pub const fn from_episodes(episodes: u16) -> Self {
        match episodes {
            0 => Self::None,
            1 => Self::Neutral,
            2 => Self::PrimaryDisable,
            _ => Self::FullDisable,
        }
    }

    #[inline]
    pub const fn drives_primary_disable(self) -> bool {
        self as u8 >= Self::PrimaryDisable as u8
    }

    #[inline]
    pub const fn drives_secondary_disable(self) -> bool {
        self as u8 >= Self::FullDisable as u8
    }
}

impl Default for DisableLevel {
    fn default() -> Self {
        Self::None
    }
}

const_assert_eq!(core::mem::size_of::<Mode>(), 1);
const_assert_eq!(core::mem::size_of::<SafetyStatus>(), 1);
const_assert_eq!(DisableLevel::FullDisable as u8, crate::consts::MAX_DISABLE_LEVEL);
