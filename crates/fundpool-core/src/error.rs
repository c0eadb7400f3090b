//! Error types for fundpool
//!
//! Only the fetch and submit boundaries fail. Calculators are total and
//! never return these.

use std::fmt;

use thiserror::Error;

use crate::{CampaignId, ProjectId};

/// Error code wallets use for a user-rejected request
pub const USER_REJECTED_CODE: i64 = 4001;

/// Core fundpool errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FundpoolError {
    // Fetch errors
    #[error("Data unavailable for campaign {campaign} after {attempts} attempts")]
    DataUnavailable { campaign: CampaignId, attempts: u32 },

    // Query errors
    #[error("Campaign {0} has not been loaded")]
    CampaignNotLoaded(CampaignId),

    #[error("Project not found: {0:?}")]
    ProjectNotFound(ProjectId),

    #[error("Invalid project id: {0:?}")]
    InvalidProjectId(String),

    // Submit errors
    #[error(transparent)]
    Transaction(#[from] TransactionFailure),
}

/// Result type for fundpool operations
pub type FundpoolResult<T> = Result<T, FundpoolError>;

/// Error as reported by the chain-access collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ChainError {
    /// Provider/wallet error code, when one was given
    pub code: Option<i64>,
    pub message: String,
}

impl ChainError {
    pub fn new(message: impl Into<String>) -> Self {
        ChainError {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        ChainError {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Class of a failed approval or distribution transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    UserRejected,
    InsufficientFunds,
    AlreadyApproved,
    AlreadyDistributed,
    Reverted,
    Network,
}

impl FailureKind {
    /// Whether submitting the same transaction again can succeed
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::UserRejected | FailureKind::InsufficientFunds | FailureKind::Network
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::UserRejected => "rejected by user",
            FailureKind::InsufficientFunds => "insufficient funds",
            FailureKind::AlreadyApproved => "already approved",
            FailureKind::AlreadyDistributed => "already distributed",
            FailureKind::Reverted => "reverted",
            FailureKind::Network => "network error",
        };
        f.write_str(label)
    }
}

/// Which transaction failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Approval,
    Distribution,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Approval => f.write_str("approval"),
            TransactionKind::Distribution => f.write_str("distribution"),
        }
    }
}

/// Classified approval/distribution failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{transaction} transaction failed ({kind}): {message}")]
pub struct TransactionFailure {
    pub transaction: TransactionKind,
    pub kind: FailureKind,
    pub message: String,
}

impl TransactionFailure {
    /// Classify a chain error raised while submitting a transaction
    pub fn classify(transaction: TransactionKind, error: &ChainError) -> Self {
        TransactionFailure {
            transaction,
            kind: classify_kind(error),
            message: error.message.clone(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

fn classify_kind(error: &ChainError) -> FailureKind {
    if error.code == Some(USER_REJECTED_CODE) {
        return FailureKind::UserRejected;
    }
    let message = error.message.to_ascii_lowercase();
    if message.contains("user rejected") || message.contains("user denied") {
        FailureKind::UserRejected
    } else if message.contains("insufficient funds") {
        FailureKind::InsufficientFunds
    } else if message.contains("already approved") {
        FailureKind::AlreadyApproved
    } else if message.contains("already distributed") {
        FailureKind::AlreadyDistributed
    } else if message.contains("revert") {
        FailureKind::Reverted
    } else {
        FailureKind::Network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(error: ChainError) -> FailureKind {
        TransactionFailure::classify(TransactionKind::Approval, &error).kind
    }

    #[test]
    fn test_classify_user_rejected_by_code() {
        assert_eq!(
            kind_of(ChainError::with_code(USER_REJECTED_CODE, "whatever")),
            FailureKind::UserRejected
        );
        assert_eq!(kind_of(ChainError::new("User denied transaction signature")), FailureKind::UserRejected);
    }

    #[test]
    fn test_classify_by_message() {
        assert_eq!(kind_of(ChainError::new("insufficient funds for gas")), FailureKind::InsufficientFunds);
        assert_eq!(kind_of(ChainError::new("Project already approved")), FailureKind::AlreadyApproved);
        assert_eq!(kind_of(ChainError::new("Funds already distributed")), FailureKind::AlreadyDistributed);
        assert_eq!(kind_of(ChainError::new("execution reverted: not admin")), FailureKind::Reverted);
        assert_eq!(kind_of(ChainError::new("connection reset")), FailureKind::Network);
    }

    #[test]
    fn test_retryable() {
        assert!(FailureKind::Network.is_retryable());
        assert!(FailureKind::UserRejected.is_retryable());
        assert!(!FailureKind::AlreadyDistributed.is_retryable());
        assert!(!FailureKind::Reverted.is_retryable());
    }

    #[test]
    fn test_failure_display() {
        let failure = TransactionFailure::classify(
            TransactionKind::Distribution,
            &ChainError::new("execution reverted"),
        );
        assert_eq!(
            failure.to_string(),
            "distribution transaction failed (reverted): execution reverted"
        );
    }
}
