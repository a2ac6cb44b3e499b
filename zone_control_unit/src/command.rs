//! Command module root.
//!
//! Stale-command detection shared by every actuator channel.

pub mod watchdog;
