//! Fundpool Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout fundpool:
//! - Identifiers (CampaignId, ProjectId)
//! - Fixed-point token amounts (18 implied decimals)
//! - Campaign, project and participation records
//! - Error types shared by the fetch and submit boundaries

pub mod id;
pub mod amount;
pub mod model;
pub mod error;

pub use id::*;
pub use amount::*;
pub use model::*;
pub use error::*;
