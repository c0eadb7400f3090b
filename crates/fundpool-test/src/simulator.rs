//! Simulated chain for service testing
//!
//! An in-memory funding contract behind [`ChainAccess`], with seeded fault
//! injection from [`ChainChaos`].

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use fundpool_core::{
    Campaign, CampaignId, ChainError, ParticipationRecord, Project, ProjectId, RawParticipation, TokenAmount,
    USER_REJECTED_CODE,
};
use fundpool_runtime::{ChainAccess, TxReceipt};

use crate::chaos::ChainChaos;

/// One campaign as the contract stores it
#[derive(Clone, Debug)]
struct CampaignRecord {
    campaign: Campaign,
    /// Raw member ids in enrolment order
    members: Vec<String>,
    /// Approved ids in approval order
    approved: Vec<ProjectId>,
    participation: HashMap<ProjectId, ParticipationRecord>,
    distributed: bool,
}

/// Call counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub reads: u64,
    pub batch_calls: u64,
    pub injected_failures: u64,
    pub dropped_entries: u64,
    pub submissions: u64,
}

struct ChainState {
    campaigns: HashMap<CampaignId, CampaignRecord>,
    projects: Vec<Project>,
    next_project: u64,
    next_tx: u64,
    chaos: ChainChaos,
    rng: StdRng,
    reject_next: Option<ChainError>,
    /// Participation batches still to fail outright
    failing_batches: u32,
    /// Projects whose participation entry is always empty
    dropped: HashSet<ProjectId>,
    stats: ChainStats,
}

/// In-memory funding contract
pub struct SimulatedChain {
    state: Mutex<ChainState>,
}

impl SimulatedChain {
    /// Fault-free chain
    pub fn new(seed: u64) -> Self {
        Self::with_chaos(ChainChaos::calm(), seed)
    }

    pub fn with_chaos(chaos: ChainChaos, seed: u64) -> Self {
        SimulatedChain {
            state: Mutex::new(ChainState {
                campaigns: HashMap::new(),
                projects: Vec::new(),
                next_project: 1,
                next_tx: 1,
                chaos,
                rng: StdRng::seed_from_u64(seed),
                reject_next: None,
                failing_batches: 0,
                dropped: HashSet::new(),
                stats: ChainStats::default(),
            }),
        }
    }

    pub fn set_chaos(&self, chaos: ChainChaos) {
        self.state.lock().chaos = chaos;
    }

    pub fn stats(&self) -> ChainStats {
        self.state.lock().stats.clone()
    }

    /// Register a project with the next sequential id
    pub fn register_project(&self, name: &str) -> ProjectId {
        let mut state = self.state.lock();
        let id = ProjectId(state.next_project);
        state.next_project += 1;
        state.projects.push(Project::new(id.to_string(), name));
        id
    }

    /// Register a project under an arbitrary raw id, valid or not
    pub fn register_raw_project(&self, project: Project) {
        self.state.lock().projects.push(project);
    }

    /// Create a campaign. Replaces any campaign with the same id.
    pub fn create_campaign(&self, campaign: Campaign) {
        let record = CampaignRecord {
            campaign: campaign.clone(),
            members: Vec::new(),
            approved: Vec::new(),
            participation: HashMap::new(),
            distributed: false,
        };
        self.state.lock().campaigns.insert(campaign.id, record);
    }

    pub fn enroll(&self, campaign: CampaignId, project: ProjectId) {
        self.enroll_raw(campaign, &project.to_string());
    }

    pub fn enroll_raw(&self, campaign: CampaignId, raw_id: &str) {
        if let Some(record) = self.state.lock().campaigns.get_mut(&campaign) {
            record.members.push(raw_id.to_string());
        }
    }

    /// Admin-side approval, bypassing submission
    pub fn approve(&self, campaign: CampaignId, project: ProjectId) {
        if let Some(record) = self.state.lock().campaigns.get_mut(&campaign) {
            if !record.approved.contains(&project) {
                record.approved.push(project);
            }
            record.participation.entry(project).or_default().approved = true;
        }
    }

    /// Add votes for a project
    pub fn cast_vote(&self, campaign: CampaignId, project: ProjectId, amount: TokenAmount) {
        if let Some(record) = self.state.lock().campaigns.get_mut(&campaign) {
            let entry = record.participation.entry(project).or_default();
            entry.vote_count = entry.vote_count + amount;
        }
    }

    /// Overwrite the per-record approval flag without touching the approved set
    pub fn set_participation_flag(&self, campaign: CampaignId, project: ProjectId, approved: bool) {
        if let Some(record) = self.state.lock().campaigns.get_mut(&campaign) {
            record.participation.entry(project).or_default().approved = approved;
        }
    }

    /// Fail the next `count` participation batches
    pub fn fail_next_batches(&self, count: u32) {
        self.state.lock().failing_batches = count;
    }

    /// Always return an empty participation entry for `project`
    pub fn drop_entry(&self, project: ProjectId) {
        self.state.lock().dropped.insert(project);
    }

    pub fn restore_entry(&self, project: ProjectId) {
        self.state.lock().dropped.remove(&project);
    }

    /// Make the next submission fail with `error`
    pub fn reject_next_submission(&self, error: ChainError) {
        self.state.lock().reject_next = Some(error);
    }

    /// Make the next submission fail as a wallet rejection
    pub fn reject_next_as_user(&self) {
        self.reject_next_submission(ChainError::with_code(USER_REJECTED_CODE, "User rejected the request."));
    }

    pub fn is_distributed(&self, campaign: CampaignId) -> bool {
        self.state
            .lock()
            .campaigns
            .get(&campaign)
            .map(|record| record.distributed)
            .unwrap_or(false)
    }

    /// Latency for one call; the lock is released before sleeping
    async fn delay(&self) {
        let latency = {
            let mut state = self.state.lock();
            let ChainState { chaos, rng, .. } = &mut *state;
            chaos.latency(rng)
        };
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }
    }

    /// Count a campaign-level read, returning an injected failure if rolled
    fn begin_read(&self) -> Result<(), ChainError> {
        let mut state = self.state.lock();
        state.stats.reads += 1;
        let ChainState { chaos, rng, .. } = &mut *state;
        if chaos.read_fails(rng) {
            state.stats.injected_failures += 1;
            return Err(ChainError::new("simulated RPC error: connection reset"));
        }
        Ok(())
    }

    fn next_receipt(state: &mut ChainState) -> TxReceipt {
        let tx = state.next_tx;
        state.next_tx += 1;
        TxReceipt::new(format!("0x{:064x}", tx))
    }
}

#[async_trait]
impl ChainAccess for SimulatedChain {
    async fn read_campaign(&self, campaign: CampaignId) -> Result<Campaign, ChainError> {
        self.delay().await;
        self.begin_read()?;
        self.state
            .lock()
            .campaigns
            .get(&campaign)
            .map(|record| record.campaign.clone())
            .ok_or_else(|| ChainError::new(format!("campaign {} does not exist", campaign)))
    }

    async fn read_all_projects(&self) -> Result<Vec<Project>, ChainError> {
        self.delay().await;
        self.begin_read()?;
        Ok(self.state.lock().projects.clone())
    }

    async fn read_campaign_project_ids(&self, campaign: CampaignId) -> Result<Vec<String>, ChainError> {
        self.delay().await;
        self.begin_read()?;
        Ok(self
            .state
            .lock()
            .campaigns
            .get(&campaign)
            .map(|record| record.members.clone())
            .unwrap_or_default())
    }

    async fn read_approved_project_ids(&self, campaign: CampaignId) -> Result<Vec<String>, ChainError> {
        self.delay().await;
        self.begin_read()?;
        Ok(self
            .state
            .lock()
            .campaigns
            .get(&campaign)
            .map(|record| record.approved.iter().map(|id| id.to_string()).collect())
            .unwrap_or_default())
    }

    async fn read_participation_batch(
        &self,
        campaign: CampaignId,
        projects: &[ProjectId],
    ) -> Result<Vec<Option<RawParticipation>>, ChainError> {
        self.delay().await;
        let mut state = self.state.lock();
        state.stats.batch_calls += 1;

        let ChainState {
            chaos,
            rng,
            campaigns,
            stats,
            failing_batches,
            dropped,
            ..
        } = &mut *state;
        if *failing_batches > 0 || chaos.batch_fails(rng) {
            *failing_batches = failing_batches.saturating_sub(1);
            stats.injected_failures += 1;
            return Err(ChainError::new("simulated RPC error: batch request timed out"));
        }

        let record = campaigns.get(&campaign);
        let mut entries = Vec::with_capacity(projects.len());
        for project in projects {
            if dropped.contains(project) || chaos.entry_dropped(rng) {
                stats.dropped_entries += 1;
                entries.push(None);
                continue;
            }
            let participation = record
                .and_then(|r| r.participation.get(project).copied())
                .unwrap_or_default();
            entries.push(Some(RawParticipation::from(participation)));
        }
        Ok(entries)
    }

    async fn submit_approval(&self, campaign: CampaignId, project: ProjectId) -> Result<TxReceipt, ChainError> {
        self.delay().await;
        let mut state = self.state.lock();
        state.stats.submissions += 1;
        if let Some(error) = state.reject_next.take() {
            return Err(error);
        }

        let record = state
            .campaigns
            .get_mut(&campaign)
            .ok_or_else(|| ChainError::new("execution reverted: campaign does not exist"))?;
        if record.approved.contains(&project) {
            return Err(ChainError::new("execution reverted: project already approved"));
        }
        record.approved.push(project);
        record.participation.entry(project).or_default().approved = true;

        Ok(Self::next_receipt(&mut state))
    }

    async fn submit_distribution(&self, campaign: CampaignId) -> Result<TxReceipt, ChainError> {
        self.delay().await;
        let mut state = self.state.lock();
        state.stats.submissions += 1;
        if let Some(error) = state.reject_next.take() {
            return Err(error);
        }

        let record = state
            .campaigns
            .get_mut(&campaign)
            .ok_or_else(|| ChainError::new("execution reverted: campaign does not exist"))?;
        if record.distributed {
            return Err(ChainError::new("execution reverted: funds already distributed"));
        }
        record.distributed = true;

        Ok(Self::next_receipt(&mut state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_campaign() -> (SimulatedChain, CampaignId, ProjectId) {
        let chain = SimulatedChain::new(7);
        let campaign = CampaignId(1);
        chain.create_campaign(Campaign::placeholder(campaign));
        let project = chain.register_project("Alpha");
        chain.enroll(campaign, project);
        (chain, campaign, project)
    }

    #[tokio::test]
    async fn test_reads_reflect_writes() {
        let (chain, campaign, project) = chain_with_campaign();
        chain.cast_vote(campaign, project, TokenAmount::from_tokens(5));
        chain.approve(campaign, project);

        assert_eq!(chain.read_campaign_project_ids(campaign).await.unwrap(), vec!["1".to_string()]);
        assert_eq!(chain.read_approved_project_ids(campaign).await.unwrap(), vec!["1".to_string()]);

        let batch = chain.read_participation_batch(campaign, &[project]).await.unwrap();
        let record = batch[0].as_ref().map(|raw| raw.normalize()).unwrap();
        assert_eq!(record.vote_count, TokenAmount::from_tokens(5));
        assert!(record.approved);
    }

    #[tokio::test]
    async fn test_unknown_campaign_read_fails() {
        let chain = SimulatedChain::new(7);
        assert!(chain.read_campaign(CampaignId(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_double_approval_reverts() {
        let (chain, campaign, project) = chain_with_campaign();

        assert!(chain.submit_approval(campaign, project).await.is_ok());
        let err = chain.submit_approval(campaign, project).await.unwrap_err();

        assert!(err.message.contains("already approved"));
    }

    #[tokio::test]
    async fn test_rejection_consumed_once() {
        let (chain, campaign, _) = chain_with_campaign();
        chain.reject_next_as_user();

        let err = chain.submit_distribution(campaign).await.unwrap_err();
        assert_eq!(err.code, Some(USER_REJECTED_CODE));
        assert!(chain.submit_distribution(campaign).await.is_ok());
        assert!(chain.is_distributed(campaign));
    }

    #[tokio::test]
    async fn test_scripted_batch_failures() {
        let (chain, campaign, project) = chain_with_campaign();
        let other = chain.register_project("Beta");
        chain.enroll(campaign, other);
        chain.fail_next_batches(2);
        chain.drop_entry(other);

        assert!(chain.read_participation_batch(campaign, &[project]).await.is_err());
        assert!(chain.read_participation_batch(campaign, &[project]).await.is_err());
        let entries = chain.read_participation_batch(campaign, &[project, other]).await.unwrap();

        assert!(entries[0].is_some());
        assert!(entries[1].is_none());
        chain.restore_entry(other);
        let entries = chain.read_participation_batch(campaign, &[other]).await.unwrap();
        assert!(entries[0].is_some());
    }

    #[tokio::test]
    async fn test_outage_fails_batches() {
        let (chain, campaign, project) = chain_with_campaign();
        chain.set_chaos(ChainChaos::participation_outage());

        assert!(chain.read_participation_batch(campaign, &[project]).await.is_err());
        assert!(chain.read_campaign(campaign).await.is_ok());
        assert_eq!(chain.stats().injected_failures, 1);
    }
}
