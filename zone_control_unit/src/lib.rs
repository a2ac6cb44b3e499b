//! # Zone Control Unit Library
//!
//! Safety core of a vehicle zone controller. Every component exposes one
//! cyclic step and is owned by the [`cycle::ZoneController`] aggregate; there
//! are no globals and nothing in the cyclic path allocates.
//!
//! ## Layers
//!
//! 1. **Primitives**: [`fault`] debouncing/latching, [`command`] watchdog
//! 2. **Bus boundary**: [`e2e`] CRC + alive-counter codec
//! 3. **Channels**: [`channel`] steering, motor, brake
//! 4. **Supervision**: [`safety`] fault aggregation, bus loss, watchdog gate
//! 5. **Mode**: [`state`] forward-only arbiter and mode actions
//!
//! Ordering inside a cycle (feedback → faults → outputs → diagnostics) is
//! fixed by [`cycle::ZoneController::run_cycle`].

pub mod channel;
pub mod command;
pub mod config;
pub mod cycle;
pub mod diag;
pub mod e2e;
pub mod fault;
pub mod safety;
pub mod scenario;
pub mod state;
