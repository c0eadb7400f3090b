//! Fundpool Distribution - Pooled-fund allocation
//!
//! This crate implements the distribution calculator:
//! - Platform and admin fee deduction
//! - Linear and quadratic weighting over decimal vote totals
//! - Presentation rounding, applied only at the display boundary
//! - Campaign summaries

pub mod fees;
pub mod calculator;
pub mod display;
pub mod summary;

pub use fees::*;
pub use calculator::*;
pub use display::*;
pub use summary::*;
