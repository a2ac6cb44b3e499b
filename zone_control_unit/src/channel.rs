//! Actuator channel root.
//!
//! One channel per controlled actuator. Each owns its fault latch, command
//! watchdog and rate/direction memory, and is mutated only by its own `step`.

pub mod brake;
pub mod motor;
pub mod steering;

pub use brake::{BrakeChannel, BrakeInputs, BrakeOutputs};
pub use motor::{MotorChannel, MotorInputs, MotorOutputs};
pub use steering::{SteeringChannel, SteeringInputs, SteeringOutputs};

use thiserror::Error;

/// The sensor or transport could not deliver a sample this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("feedback read failed")]
pub struct ReadFailure;

/// One feedback sample.
pub type Feedback<T> = Result<T, ReadFailure>;
