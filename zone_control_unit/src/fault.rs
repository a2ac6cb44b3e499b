//! Fault module root.
//!
//! Consecutive-cycle confirmation, latch-with-clear, and the 1 ms current
//! monitor built on them.

pub mod current;
pub mod debounce;
