//! Diagnostic event identifiers.
//!
//! The core reports FAILED / PASSED transitions against these IDs. Storage
//! and debouncing belong to the sink.

use serde::{Deserialize, Serialize};

/// Diagnostic events raised by the safety core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DiagEventId {
    SteerPlausibility = 0,
    SteerRange = 1,
    SteerSensor = 2,
    SteerTimeout = 3,
    MotorShootThrough = 4,
    MotorTimeout = 5,
    MotorOvercurrent = 6,
    BrakeDeviation = 7,
    BrakeTimeout = 8,
    BrakeSensor = 9,
    BusLoss = 10,
    WatchdogFail = 11,
    E2eTorque = 12,
    E2eSteer = 13,
    E2eBrake = 14,
}

impl DiagEventId {
    /// Number of event IDs, used to size per-event tables.
    pub const COUNT: usize = 15;

    /// Table index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from raw `u8`. Returns `None` for invalid values.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::SteerPlausibility),
            1 => Some(Self::SteerRange),
            2 => Some(Self::SteerSensor),
            3 => Some(Self::SteerTimeout),
            4 => Some(Self::MotorShootThrough),
            5 => Some(Self::MotorTimeout),
            6 => Some(Self::MotorOvercurrent),
            7 => Some(Self::BrakeDeviation),
            8 => Some(Self::BrakeTimeout),
            9 => Some(Self::BrakeSensor),
            10 => Some(Self::BusLoss),
            11 => Some(Self::WatchdogFail),
            12 => Some(Self::E2eTorque),
            13 => Some(Self::E2eSteer),
            14 => Some(Self::E2eBrake),
            _ => None,
        }
    }
}

/// Outcome reported for one diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventStatus {
    Passed = 0,
    Failed = 1,
}

impl EventStatus {
    #[inline]
    pub const fn from_failed(failed: bool) -> Self {
        if failed { Self::Failed } else { Self::Passed }
    }
}
