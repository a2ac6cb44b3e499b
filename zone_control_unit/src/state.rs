//! Operating-mode state machine and per-mode action dispatch.

pub mod actions;
pub mod mode;

pub use actions::{ModeAction, ModeActionHandler, ModeActionTable};
pub use mode::{ModeArbiter, ModeTransition, is_transition_valid};
