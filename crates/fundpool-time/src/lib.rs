//! Fundpool Time - Campaign phase clock
//!
//! This crate implements:
//! - Clock sources (system wall clock, manually driven clock)
//! - Campaign lifecycle phases: loading → preparing → active → ended
//! - Countdowns to the next phase boundary

pub mod clock;
pub mod phase;

pub use clock::*;
pub use phase::*;
