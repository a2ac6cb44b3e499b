//! Zone-controller shared types.
//!
//! Everything the safety core exchanges with its collaborators: operating
//! mode and health enums, the fault bitmask, per-channel fault codes,
//! tuning parameters and diagnostic event identifiers.

pub mod config;
pub mod diag;
pub mod error;
pub mod state;
