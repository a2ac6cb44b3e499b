//! Fault bitmask and per-channel fault codes.
//!
//! `FaultMask` is rebuilt from scratch by the supervisor every cycle. Flags in
//! `CRITICAL_MASK` drive the status to FAULT and block the watchdog feed.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Global fault categories aggregated by the safety supervisor.
    ///
    /// CRITICAL flags (→ FAULT): OVERCURRENT, OVERTEMP, DIRECTION, BUS_LOSS.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultMask: u16 {
        /// Motor current above threshold (debounced). **CRITICAL**.
        const OVERCURRENT = 0x0001;
        /// Motor or driver over temperature. **CRITICAL**.
        const OVERTEMP    = 0x0002;
        /// Encoder direction disagrees with commanded direction. **CRITICAL**.
        const DIRECTION   = 0x0004;
        /// Bus silent, in error warning for too long, or bus-off. **CRITICAL**.
        const BUS_LOSS    = 0x0008;
        /// Watchdog feed withheld this cycle.
        const WATCHDOG    = 0x0010;
        /// Last self-test failed.
        const SELF_TEST   = 0x0020;
        /// Supply voltage out of range.
        const BATTERY     = 0x0040;
        /// Motor stalled under load.
        const STALL       = 0x0080;
        /// Steering channel latched.
        const STEERING    = 0x0100;
        /// Brake channel latched.
        const BRAKE       = 0x0200;
        /// Motor bridge terminal latch (power cycle required).
        const BRIDGE      = 0x0400;
    }
}

impl FaultMask {
    /// Mask of all CRITICAL flags.
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::OVERCURRENT.bits()
            | Self::OVERTEMP.bits()
            | Self::DIRECTION.bits()
            | Self::BUS_LOSS.bits(),
    );

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for FaultMask {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Channel Fault Codes ────────────────────────────────────────────

/// Steering channel fault code. Code 3 is reserved on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SteeringFault {
    None = 0,
    /// Output and feedback disagree for the debounce window.
    Plausibility = 1,
    /// Commanded angle outside the configured range.
    OutOfRange = 2,
    /// Command unchanged for the timeout window.
    CmdTimeout = 4,
    /// Angle sensor read failed.
    ReadFail = 5,
}

impl SteeringFault {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Plausibility),
            2 => Some(Self::OutOfRange),
            4 => Some(Self::CmdTimeout),
            5 => Some(Self::ReadFail),
            _ => None,
        }
    }

    /// Faults that latch and force the neutral output.
    #[inline]
    pub const fn latches(self) -> bool {
        !matches!(self, Self::None | Self::CmdTimeout)
    }
}

impl Default for SteeringFault {
    fn default() -> Self {
        Self::None
    }
}

/// Motor channel fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotorFault {
    None = 0,
    /// Both bridge halves requested at once. Terminal.
    ShootThrough = 1,
    /// Torque command unchanged for the timeout window.
    CmdTimeout = 2,
    /// Current monitor latched.
    Overcurrent = 3,
}

impl MotorFault {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::ShootThrough),
            2 => Some(Self::CmdTimeout),
            3 => Some(Self::Overcurrent),
            _ => None,
        }
    }
}

impl Default for MotorFault {
    fn default() -> Self {
        Self::None
    }
}

/// Brake channel fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BrakeFault {
    None = 0,
    /// Feedback deviates from command for the debounce window.
    PwmDeviation = 1,
    /// Brake command unchanged for the timeout window. Latches like any other fault.
    CmdTimeout = 2,
    /// Latch held with no new fault this cycle.
    Latched = 3,
    /// Feedback read failed.
    ReadFail = 4,
    /// Emergency stop requested.
    EmergencyStop = 5,
}

impl BrakeFault {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::PwmDeviation),
            2 => Some(Self::CmdTimeout),
            3 => Some(Self::Latched),
            4 => Some(Self::ReadFail),
            5 => Some(Self::EmergencyStop),
            _ => None,
        }
    }
}

impl Default for BrakeFault {
    fn default() -> Self {
        Self::None
    }
}
