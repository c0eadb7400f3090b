//! Fundpool Test Harness - Simulation and pipeline validation
//!
//! This crate provides:
//! - Chain fault injection (latency, failed reads, dropped entries)
//! - A simulated funding contract behind the chain-access trait
//! - Seeded fuzzing of reconcile, rank and distribute invariants
//! - End-to-end service scenarios

pub mod chaos;
pub mod simulator;
pub mod pipeline_fuzzer;
pub mod integration;

pub use chaos::*;
pub use simulator::*;
pub use pipeline_fuzzer::*;
pub use integration::*;
