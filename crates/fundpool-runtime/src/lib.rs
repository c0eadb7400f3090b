//! Fundpool Runtime - Campaign service orchestration
//!
//! This crate drives the pure pipeline from live chain data:
//! 1. Issue a request token (superseding any in-flight refresh)
//! 2. Read campaign, membership, projects and approved ids
//! 3. Fetch participation in one batch, retrying with fixed backoff
//! 4. Reconcile into canonical views
//! 5. Install the snapshot if the token is still current
//! 6. Serve ranking, distribution and phase queries from the snapshot
//!
//! Approval and distribution submissions are classified here; failures
//! never touch the installed snapshot.

pub mod chain;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod service;
pub mod ticker;

pub use chain::*;
pub use config::*;
pub use fetch::*;
pub use logging::*;
pub use service::*;
pub use ticker::*;
