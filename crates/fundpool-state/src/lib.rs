//! Fundpool State - Reconciliation, ranking and snapshots
//!
//! This crate implements the per-campaign state pipeline:
//! - Participation reconciliation into one canonical view per project
//! - Competition ranking of approved projects
//! - Versioned, atomically swapped campaign snapshots

pub mod reconcile;
pub mod rank;
pub mod snapshot;

pub use reconcile::*;
pub use rank::*;
pub use snapshot::*;
