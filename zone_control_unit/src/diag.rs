//! Diagnostic reporting.
//!
//! Channels and the supervisor report every event every cycle. The
//! [`sink::TransitionFilter`] narrows that stream to status changes before it
//! reaches an external sink, while [`memory::EventMemory`] sees the full
//! stream and applies its own counter debounce.

pub mod memory;
pub mod sink;

pub use sink::{DiagnosticRecorder, DiagnosticSink, NullSink, TransitionFilter};
