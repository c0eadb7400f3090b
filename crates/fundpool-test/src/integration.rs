//! End-to-end Integration Test Suite
//!
//! Drives [`CampaignService`] against a [`SimulatedChain`]:
//! - Refresh, ranking and distribution on a live campaign
//! - Approval authority and submission failures
//! - Superseded refreshes and degraded participation
//! - Phase transitions from a manual clock

use std::sync::Arc;

use fundpool_core::{Campaign, CampaignId, DistributionMode, ProjectId, TokenAmount};
use fundpool_runtime::{CampaignService, ServiceConfig};
use fundpool_time::{Clock, ManualClock};

use crate::chaos::ChainChaos;
use crate::simulator::SimulatedChain;

/// Campaign setup for a scenario
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub campaign: CampaignId,
    pub total_tokens: u64,
    pub admin_fee_percent: u64,
    pub max_winners: u32,
    pub start_time: u64,
    pub end_time: u64,
    /// `(name, whole-token votes, approved)` in enrolment order
    pub projects: Vec<(String, u64, bool)>,
    pub chaos: ChainChaos,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            campaign: CampaignId(1),
            total_tokens: 1000,
            admin_fee_percent: 5,
            max_winners: 0,
            start_time: 1_700_000_000,
            end_time: 1_700_604_800,
            projects: Vec::new(),
            chaos: ChainChaos::calm(),
            seed: 42,
        }
    }
}

impl ScenarioConfig {
    /// Two approved projects with 300 and 100 votes
    pub fn two_projects() -> Self {
        ScenarioConfig {
            projects: vec![("Alpha".into(), 300, true), ("Beta".into(), 100, true)],
            ..ScenarioConfig::default()
        }
    }

    /// Three approved projects with 400, 100 and 100 votes
    pub fn leader_and_followers() -> Self {
        ScenarioConfig {
            projects: vec![
                ("Leader".into(), 400, true),
                ("Second".into(), 100, true),
                ("Third".into(), 100, true),
            ],
            ..ScenarioConfig::default()
        }
    }

    /// Tie at the top plus an unapproved project with the most votes
    pub fn tie_with_outsider() -> Self {
        ScenarioConfig {
            projects: vec![
                ("Tied A".into(), 300, true),
                ("Tied B".into(), 300, true),
                ("Last".into(), 100, true),
                ("Outsider".into(), 900, false),
            ],
            ..ScenarioConfig::default()
        }
    }

    pub fn with_chaos(mut self, chaos: ChainChaos) -> Self {
        self.chaos = chaos;
        self
    }
}

/// A running scenario: chain, clock and service wired together
pub struct Scenario {
    pub config: ScenarioConfig,
    pub chain: Arc<SimulatedChain>,
    pub clock: ManualClock,
    pub service: CampaignService,
    pub project_ids: Vec<ProjectId>,
}

impl Scenario {
    /// Populate a simulated chain and build a service over it. The clock
    /// starts one hour before the campaign opens.
    pub fn new(config: ScenarioConfig) -> Self {
        let chain = Arc::new(SimulatedChain::with_chaos(config.chaos.clone(), config.seed));

        let mut campaign = Campaign::placeholder(config.campaign);
        campaign.name = "Scenario".to_string();
        campaign.total_funds = TokenAmount::from_tokens(config.total_tokens);
        campaign.admin_fee_percentage = config.admin_fee_percent;
        campaign.max_winners = config.max_winners;
        campaign.start_time = Some(config.start_time);
        campaign.end_time = Some(config.end_time);
        campaign.distribution_mode = DistributionMode::Linear;
        campaign.active = true;
        chain.create_campaign(campaign);

        let mut project_ids = Vec::with_capacity(config.projects.len());
        for (name, votes, approved) in &config.projects {
            let id = chain.register_project(name);
            chain.enroll(config.campaign, id);
            chain.cast_vote(config.campaign, id, TokenAmount::from_tokens(*votes));
            if *approved {
                chain.approve(config.campaign, id);
            }
            project_ids.push(id);
        }

        let clock = ManualClock::new(config.start_time.saturating_sub(3_600));
        let clock_handle: Arc<dyn Clock> = Arc::new(clock.clone());
        let service = CampaignService::with_clock(chain.clone(), clock_handle, ServiceConfig::default());

        Scenario {
            config,
            chain,
            clock,
            service,
            project_ids,
        }
    }

    pub fn campaign(&self) -> CampaignId {
        self.config.campaign
    }

    pub fn project(&self, index: usize) -> ProjectId {
        self.project_ids[index]
    }
}
