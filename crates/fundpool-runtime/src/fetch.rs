//! Retrying chain reads
//!
//! Campaign-level reads fail hard after the last attempt; the refresh is
//! abandoned and the last-good snapshot stays. The participation batch fails
//! soft: projects still missing after the last attempt are reported and
//! later default to zero votes.

use std::collections::HashMap;
use std::future::Future;

use tokio::time::{sleep, timeout};

use fundpool_core::{CampaignId, ChainError, FundpoolError, FundpoolResult, ParticipationRecord, ProjectId};

use crate::{ChainAccess, FetchPolicy};

/// Participation gathered by one refresh
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipationBatch {
    pub records: HashMap<ProjectId, ParticipationRecord>,
    /// Still unavailable after every attempt
    pub missing: Vec<ProjectId>,
    pub attempts: u32,
}

impl ParticipationBatch {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Run a read under the retry policy. Each attempt is bounded by the
/// per-attempt timeout; attempts are separated by the fixed backoff.
pub async fn read_with_retry<T, F, Fut>(
    policy: &FetchPolicy,
    campaign: CampaignId,
    what: &'static str,
    mut read: F,
) -> FundpoolResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match timeout(policy.attempt_timeout, read()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(%campaign, what, attempt, error = %e, "chain read failed");
            }
            Err(_) => {
                tracing::warn!(%campaign, what, attempt, timeout = ?policy.attempt_timeout, "chain read timed out");
            }
        }
        if attempt < attempts {
            sleep(policy.backoff).await;
        }
    }
    Err(FundpoolError::DataUnavailable { campaign, attempts })
}

/// Fetch participation for `projects` as one batch.
///
/// Every attempt re-requests only the projects still missing. Results
/// accumulate within this call only; nothing is merged with earlier
/// snapshots.
pub async fn fetch_participation(
    chain: &dyn ChainAccess,
    campaign: CampaignId,
    projects: &[ProjectId],
    policy: &FetchPolicy,
) -> ParticipationBatch {
    let mut batch = ParticipationBatch::default();
    let mut pending: Vec<ProjectId> = projects.to_vec();
    let max_attempts = policy.max_attempts.max(1);

    while !pending.is_empty() && batch.attempts < max_attempts {
        if batch.attempts > 0 {
            sleep(policy.backoff).await;
        }
        batch.attempts += 1;

        match timeout(policy.attempt_timeout, chain.read_participation_batch(campaign, &pending)).await {
            Ok(Ok(entries)) => {
                let mut still_missing = Vec::new();
                for (i, project) in pending.iter().enumerate() {
                    match entries.get(i) {
                        Some(Some(raw)) => {
                            batch.records.insert(*project, raw.normalize());
                        }
                        _ => still_missing.push(*project),
                    }
                }
                if !still_missing.is_empty() {
                    tracing::debug!(
                        %campaign,
                        attempt = batch.attempts,
                        missing = still_missing.len(),
                        "participation batch incomplete"
                    );
                }
                pending = still_missing;
            }
            Ok(Err(e)) => {
                tracing::warn!(%campaign, attempt = batch.attempts, error = %e, "participation batch failed");
            }
            Err(_) => {
                tracing::warn!(%campaign, attempt = batch.attempts, "participation batch timed out");
            }
        }
    }

    if !pending.is_empty() {
        tracing::warn!(
            %campaign,
            attempts = batch.attempts,
            missing = pending.len(),
            "participation unavailable; defaulting to zero votes"
        );
    }
    batch.missing = pending;
    batch
}
