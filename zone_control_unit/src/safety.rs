//! Safety module root.
//!
//! Bus-loss detection and the cross-channel supervisor that owns the fault
//! mask, the status derivation and the watchdog feed decision.

pub mod bus;
pub mod supervisor;

pub use bus::BusMonitor;
pub use supervisor::{FaultFlags, SafetyReport, SafetySupervisor, SupervisorInputs};
