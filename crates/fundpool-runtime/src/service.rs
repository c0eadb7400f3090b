//! Campaign service
//!
//! Owns the chain handle, the snapshot store and the clock. Refreshes build a
//! complete snapshot off to the side and install it only when their request
//! token is still the latest; queries read whichever snapshot is current.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fundpool_core::{
    ApprovedIdSet, Campaign, CampaignId, ChainError, FundpoolError, FundpoolResult, Project, ProjectId,
    TransactionFailure, TransactionKind, WeightingMode,
};
use fundpool_distribution::{summarize, CampaignSummary, Distribution, DistributionCalculator};
use fundpool_state::{
    reconcile, CampaignSnapshot, CanonicalProjectView, DataStatus, InstallOutcome, RankedView,
    RequestToken, SharedSnapshots,
};
use fundpool_time::{derive_phase, Clock, PhaseState, SystemClock};

use crate::{fetch_participation, read_with_retry, ChainAccess, PhaseTicker, ServiceConfig, TxReceipt};

/// Result of one refresh
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Installed { version: u64, status: DataStatus },
    /// A newer refresh was issued for the campaign before this one finished
    Superseded { token: RequestToken },
}

impl RefreshOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, RefreshOutcome::Installed { .. })
    }
}

/// Refresh counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub refreshes: u64,
    pub installed: u64,
    pub superseded: u64,
    pub failed: u64,
    pub degraded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    refreshes: AtomicU64,
    installed: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
    degraded: AtomicU64,
}

/// Campaign service over a chain backend
#[derive(Clone)]
pub struct CampaignService {
    chain: Arc<dyn ChainAccess>,
    clock: Arc<dyn Clock>,
    snapshots: SharedSnapshots,
    calculator: DistributionCalculator,
    config: ServiceConfig,
    counters: Arc<Counters>,
}

impl CampaignService {
    pub fn new(chain: Arc<dyn ChainAccess>, config: ServiceConfig) -> Self {
        Self::with_clock(chain, Arc::new(SystemClock), config)
    }

    pub fn with_clock(chain: Arc<dyn ChainAccess>, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        CampaignService {
            chain,
            clock,
            snapshots: SharedSnapshots::new(),
            calculator: DistributionCalculator::with_platform_fee(config.platform_fee_percent),
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            refreshes: self.counters.refreshes.load(Ordering::Relaxed),
            installed: self.counters.installed.load(Ordering::Relaxed),
            superseded: self.counters.superseded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            degraded: self.counters.degraded.load(Ordering::Relaxed),
        }
    }

    /// Rebuild a campaign's snapshot from chain data.
    ///
    /// A hard read failure leaves the current snapshot in place and returns
    /// `DataUnavailable`. Missing participation degrades the snapshot
    /// instead of failing it.
    pub async fn refresh(&self, campaign: CampaignId) -> FundpoolResult<RefreshOutcome> {
        self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
        let token = self.snapshots.issue(campaign);
        tracing::debug!(%campaign, token = token.0, "refresh started");

        let result = self.build_snapshot(campaign, token).await;
        let snapshot = match result {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(self.superseded(campaign, token)),
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%campaign, token = token.0, error = %e, "refresh failed; keeping last snapshot");
                return Err(e);
            }
        };

        let status = snapshot.status.clone();
        match self.snapshots.install(token, snapshot) {
            InstallOutcome::Installed { version } => {
                self.counters.installed.fetch_add(1, Ordering::Relaxed);
                if status.is_degraded() {
                    self.counters.degraded.fetch_add(1, Ordering::Relaxed);
                }
                tracing::info!(%campaign, version, degraded = status.is_degraded(), "snapshot installed");
                Ok(RefreshOutcome::Installed { version, status })
            }
            InstallOutcome::Superseded { .. } => Ok(self.superseded(campaign, token)),
        }
    }

    fn superseded(&self, campaign: CampaignId, token: RequestToken) -> RefreshOutcome {
        self.counters.superseded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%campaign, token = token.0, "refresh superseded; result discarded");
        RefreshOutcome::Superseded { token }
    }

    /// `Ok(None)` when the token went stale before participation was fetched
    async fn build_snapshot(
        &self,
        campaign: CampaignId,
        token: RequestToken,
    ) -> FundpoolResult<Option<CampaignSnapshot>> {
        let policy = &self.config.fetch;
        let chain = self.chain.as_ref();

        let (details, membership, all_projects, approved_raw) = tokio::try_join!(
            read_with_retry(policy, campaign, "campaign", || chain.read_campaign(campaign)),
            read_with_retry(policy, campaign, "membership", || chain.read_campaign_project_ids(campaign)),
            read_with_retry(policy, campaign, "projects", || chain.read_all_projects()),
            read_with_retry(policy, campaign, "approved ids", || chain.read_approved_project_ids(campaign)),
        )?;

        if !self.snapshots.is_latest(campaign, token) {
            return Ok(None);
        }

        let projects = campaign_projects(&membership, all_projects);
        let approved = ApprovedIdSet::from_raw(&approved_raw);
        let ids = fetch_order(&projects);

        let batch = fetch_participation(chain, campaign, &ids, policy).await;
        let reconciled = reconcile(&projects, &approved, &batch.records);
        if reconciled.excluded > 0 {
            tracing::warn!(%campaign, excluded = reconciled.excluded, "projects with invalid ids excluded");
        }

        let status = if batch.missing.is_empty() {
            DataStatus::Complete
        } else {
            DataStatus::Degraded { missing: batch.missing }
        };
        Ok(Some(CampaignSnapshot::new(details, reconciled.views, status)))
    }

    /// Hook for a newly cast vote
    pub async fn record_vote(&self, campaign: CampaignId) -> FundpoolResult<RefreshOutcome> {
        tracing::debug!(%campaign, "vote recorded; refreshing");
        self.refresh(campaign).await
    }

    pub fn snapshot(&self, campaign: CampaignId) -> FundpoolResult<Arc<CampaignSnapshot>> {
        self.snapshots
            .get(campaign)
            .ok_or(FundpoolError::CampaignNotLoaded(campaign))
    }

    pub fn canonical_projects(&self, campaign: CampaignId) -> FundpoolResult<Vec<CanonicalProjectView>> {
        Ok(self.snapshot(campaign)?.views.clone())
    }

    pub fn project(&self, campaign: CampaignId, project: ProjectId) -> FundpoolResult<CanonicalProjectView> {
        self.snapshot(campaign)?
            .view(project)
            .cloned()
            .ok_or(FundpoolError::ProjectNotFound(project))
    }

    pub fn ranked_projects(&self, campaign: CampaignId) -> FundpoolResult<Vec<RankedView>> {
        Ok(self.snapshot(campaign)?.ranked())
    }

    pub fn compute_distribution(&self, campaign: CampaignId, mode: WeightingMode) -> FundpoolResult<Distribution> {
        let snapshot = self.snapshot(campaign)?;
        Ok(self.calculator.compute(&snapshot, mode))
    }

    /// Distribution under the campaign's own mode; custom campaigns fall
    /// back to linear
    pub fn default_distribution(&self, campaign: CampaignId) -> FundpoolResult<Distribution> {
        let snapshot = self.snapshot(campaign)?;
        let mode = snapshot
            .campaign
            .distribution_mode
            .weighting()
            .unwrap_or(WeightingMode::Linear);
        Ok(self.calculator.compute(&snapshot, mode))
    }

    pub fn summary(&self, campaign: CampaignId) -> FundpoolResult<CampaignSummary> {
        let snapshot = self.snapshot(campaign)?;
        Ok(summarize(&snapshot, self.calculator.fees_for(&snapshot)))
    }

    /// Phase of a loaded campaign at the service clock's current reading
    pub fn phase(&self, campaign: CampaignId) -> FundpoolResult<PhaseState> {
        let snapshot = self.snapshot(campaign)?;
        Ok(phase_of(&snapshot.campaign, self.clock.now_unix()))
    }

    /// Spawn a ticker for a loaded campaign at the configured period
    pub fn phase_ticker(&self, campaign: CampaignId) -> FundpoolResult<PhaseTicker> {
        let snapshot = self.snapshot(campaign)?;
        Ok(PhaseTicker::spawn(
            self.clock.clone(),
            snapshot.campaign.start_time,
            snapshot.campaign.end_time,
            self.config.phase_tick,
        ))
    }

    /// Submit an approval. On success the campaign is refreshed so the new
    /// approval supersedes any in-flight fetch.
    pub async fn submit_approval(
        &self,
        campaign: CampaignId,
        project: ProjectId,
    ) -> Result<TxReceipt, TransactionFailure> {
        let receipt = self
            .chain
            .submit_approval(campaign, project)
            .await
            .map_err(|e| self.classify(TransactionKind::Approval, campaign, &e))?;
        tracing::info!(%campaign, %project, tx = %receipt.tx_hash, "approval submitted");

        if let Err(e) = self.refresh(campaign).await {
            tracing::warn!(%campaign, error = %e, "refresh after approval failed");
        }
        Ok(receipt)
    }

    pub async fn submit_distribution(&self, campaign: CampaignId) -> Result<TxReceipt, TransactionFailure> {
        let receipt = self
            .chain
            .submit_distribution(campaign)
            .await
            .map_err(|e| self.classify(TransactionKind::Distribution, campaign, &e))?;
        tracing::info!(%campaign, tx = %receipt.tx_hash, "distribution submitted");
        Ok(receipt)
    }

    fn classify(
        &self,
        transaction: TransactionKind,
        campaign: CampaignId,
        error: &ChainError,
    ) -> TransactionFailure {
        let failure = TransactionFailure::classify(transaction, error);
        tracing::warn!(%campaign, %transaction, kind = %failure.kind, "{}", failure.message);
        failure
    }
}

fn phase_of(campaign: &Campaign, now: u64) -> PhaseState {
    derive_phase(campaign.start_time, campaign.end_time, now)
}

/// Campaign project list in membership order. Members missing from the
/// project registry are kept with an empty name.
fn campaign_projects(membership: &[String], all_projects: Vec<Project>) -> Vec<Project> {
    let mut registry: HashMap<ProjectId, Project> = HashMap::new();
    for project in all_projects {
        if let Some(id) = ProjectId::parse(&project.id) {
            registry.entry(id).or_insert(project);
        }
    }

    membership
        .iter()
        .map(|raw| {
            ProjectId::parse(raw)
                .and_then(|id| registry.get(&id).cloned())
                .unwrap_or_else(|| Project::new(raw.clone(), ""))
        })
        .collect()
}

/// Distinct valid ids in list order
fn fetch_order(projects: &[Project]) -> Vec<ProjectId> {
    let mut seen = HashSet::new();
    projects
        .iter()
        .filter_map(|project| ProjectId::parse(&project.id))
        .filter(|id| seen.insert(*id))
        .collect()
}
