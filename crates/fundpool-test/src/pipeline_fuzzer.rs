//! Pipeline Fuzzer - Randomised checking of reconcile → rank → distribute
//!
//! Tests:
//! - Approval authority (the approved-id set wins over record flags)
//! - Competition ranking shape
//! - Distribution conservation and zero-vote handling
//! - Quadratic compression relative to linear weighting

use std::collections::HashMap;

use fundpool_core::{ApprovedIdSet, ParticipationRecord, Project, ProjectId, TokenAmount, WeightingMode};
use fundpool_distribution::{compute_distribution, Distribution, FeeSchedule};
use fundpool_state::{rank_projects, reconcile, CanonicalProjectView, RankedView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Campaigns to generate
    pub campaign_count: usize,
    /// Upper bound on projects per campaign
    pub max_projects: usize,
    /// Upper bound on whole-token votes per project
    pub max_votes: u64,
    /// Probability a project is approved (0.0 - 1.0)
    pub approval_prob: f64,
    /// Probability a project's participation record is missing
    pub missing_prob: f64,
    /// Probability a project id is malformed or repeated
    pub bad_id_prob: f64,
    /// Probability of copying the previous project's vote count
    pub tie_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            campaign_count: 200,
            max_projects: 30,
            max_votes: 10_000,
            approval_prob: 0.7,
            missing_prob: 0.1,
            bad_id_prob: 0.05,
            tie_prob: 0.2,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            campaign_count: 25,
            max_projects: 8,
            ..FuzzerConfig::default()
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            campaign_count: 2_000,
            max_projects: 100,
            max_votes: 1_000_000_000,
            ..FuzzerConfig::default()
        }
    }
}

/// One generated campaign input
#[derive(Clone, Debug)]
pub struct GeneratedCampaign {
    pub projects: Vec<Project>,
    pub approved: ApprovedIdSet,
    pub participation: HashMap<ProjectId, ParticipationRecord>,
    pub total_funds: TokenAmount,
    pub fees: FeeSchedule,
}

/// Fuzzing result
#[derive(Debug, Default)]
pub struct FuzzResult {
    pub campaigns_checked: usize,
    pub authority_violations: u32,
    pub rank_violations: u32,
    pub distribution_violations: u32,
    /// First few violation descriptions
    pub samples: Vec<String>,
}

const MAX_SAMPLES: usize = 10;

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.authority_violations == 0 && self.rank_violations == 0 && self.distribution_violations == 0
    }

    fn note(&mut self, campaign: usize, message: String) {
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(format!("campaign {}: {}", campaign, message));
        }
    }
}

/// Pipeline fuzzer
pub struct PipelineFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
}

impl PipelineFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        PipelineFuzzer { config, rng }
    }

    /// Generate one campaign
    pub fn generate(&mut self) -> GeneratedCampaign {
        let count = self.rng.gen_range(0..=self.config.max_projects);
        let mut projects = Vec::with_capacity(count);
        let mut approved = ApprovedIdSet::new();
        let mut participation = HashMap::new();
        let mut last_votes = TokenAmount::ZERO;

        for i in 0..count {
            let id = ProjectId(i as u64 + 1);

            if self.rng.gen::<f64>() < self.config.bad_id_prob {
                let raw = if i > 0 && self.rng.gen_bool(0.5) {
                    // repeat of an earlier id
                    format!("{}", self.rng.gen_range(1..=i))
                } else {
                    format!("not-an-id-{}", i)
                };
                projects.push(Project::new(raw, format!("Bad {}", i)));
                continue;
            }

            let raw = if self.rng.gen_bool(0.2) {
                format!("0x{:x}", id.0)
            } else {
                id.to_string()
            };
            projects.push(Project::new(raw, format!("Project {}", i)));

            let is_approved = self.rng.gen::<f64>() < self.config.approval_prob;
            if is_approved {
                approved.insert(id);
            }

            if self.rng.gen::<f64>() < self.config.missing_prob {
                continue;
            }
            let votes = if i > 0 && self.rng.gen::<f64>() < self.config.tie_prob {
                last_votes
            } else {
                self.random_votes()
            };
            last_votes = votes;
            participation.insert(
                id,
                ParticipationRecord {
                    // stale flag, deliberately contradicting the approved set half the time
                    approved: if self.rng.gen_bool(0.5) { !is_approved } else { is_approved },
                    vote_count: votes,
                    funds_received: TokenAmount::ZERO,
                },
            );
        }

        let total_funds = TokenAmount::from_tokens(self.rng.gen_range(0..1_000_000));
        let fees = FeeSchedule::with_admin(self.rng.gen_range(0..=90));

        GeneratedCampaign {
            projects,
            approved,
            participation,
            total_funds,
            fees,
        }
    }

    /// Whole tokens plus a random fraction
    fn random_votes(&mut self) -> TokenAmount {
        if self.rng.gen_bool(0.1) {
            return TokenAmount::ZERO;
        }
        let whole = TokenAmount::from_tokens(self.rng.gen_range(0..=self.config.max_votes));
        let fraction = TokenAmount::from_raw(self.rng.gen_range(0..TokenAmount::SCALE));
        whole + fraction
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> FuzzResult {
        let mut result = FuzzResult::default();

        for index in 0..self.config.campaign_count {
            let campaign = self.generate();
            let views = reconcile(&campaign.projects, &campaign.approved, &campaign.participation).views;

            if let Some(message) = properties::approval_from_set(&views, &campaign.approved) {
                result.authority_violations += 1;
                result.note(index, message);
            }

            let ranked = rank_projects(&views, 0);
            if let Some(message) = properties::competition_ranks(&ranked) {
                result.rank_violations += 1;
                result.note(index, message);
            }

            for mode in [WeightingMode::Linear, WeightingMode::Quadratic] {
                let distribution = compute_distribution(&views, campaign.total_funds, campaign.fees, mode);
                if let Some(message) = properties::conserves_pool(&distribution)
                    .or_else(|| properties::zero_votes_zero_amount(&distribution))
                    .or_else(|| properties::approved_only(&distribution, &views))
                {
                    result.distribution_violations += 1;
                    result.note(index, message);
                }
            }

            let linear = compute_distribution(&views, campaign.total_funds, campaign.fees, WeightingMode::Linear);
            let quadratic =
                compute_distribution(&views, campaign.total_funds, campaign.fees, WeightingMode::Quadratic);
            if let Some(message) = properties::quadratic_compresses(&linear, &quadratic) {
                result.distribution_violations += 1;
                result.note(index, message);
            }

            result.campaigns_checked += 1;
        }

        result
    }
}

/// Property checks; each returns a description of the first violation
pub mod properties {
    use super::*;

    const REL_TOLERANCE: f64 = 1e-6;

    /// Every view's approval matches the approved-id set
    pub fn approval_from_set(views: &[CanonicalProjectView], approved: &ApprovedIdSet) -> Option<String> {
        views
            .iter()
            .find(|view| view.approved != approved.contains(view.project_id))
            .map(|view| format!("project {} approval does not follow the approved set", view.project_id))
    }

    /// Approved first with ranks 1.., ties share a rank, the next distinct
    /// count skips; unapproved last with no rank
    pub fn competition_ranks(ranked: &[RankedView]) -> Option<String> {
        let mut seen_unranked = false;
        for (i, entry) in ranked.iter().enumerate() {
            match entry.rank {
                None => {
                    if entry.view.approved {
                        return Some(format!("approved project {} unranked", entry.view.project_id));
                    }
                    seen_unranked = true;
                }
                Some(rank) => {
                    if seen_unranked || !entry.view.approved {
                        return Some(format!("ranked entry {} out of place", entry.view.project_id));
                    }
                    let expected = match i {
                        0 => 1,
                        _ if ranked[i - 1].view.vote_count == entry.view.vote_count => {
                            ranked[i - 1].rank.unwrap_or(0)
                        }
                        _ => i as u32 + 1,
                    };
                    if rank != expected {
                        return Some(format!("rank {} at index {}, expected {}", rank, i, expected));
                    }
                    if i > 0 && ranked[i - 1].view.vote_count < entry.view.vote_count {
                        return Some(format!("votes increase at index {}", i));
                    }
                }
            }
        }
        None
    }

    /// Amounts sum to the available pool when any weight exists, else all zero
    pub fn conserves_pool(distribution: &Distribution) -> Option<String> {
        let total = distribution.total_amount();
        if distribution.entries.iter().any(|entry| entry.amount < 0.0 || !entry.amount.is_finite()) {
            return Some("negative or non-finite amount".to_string());
        }
        if distribution.total_weight > 0.0 {
            let expected = distribution.available_for_projects;
            let tolerance = REL_TOLERANCE * expected.max(1.0);
            if (total - expected).abs() > tolerance {
                return Some(format!("amounts sum to {} not {}", total, expected));
            }
        } else if total != 0.0 {
            return Some(format!("zero weight but {} allocated", total));
        }
        None
    }

    pub fn zero_votes_zero_amount(distribution: &Distribution) -> Option<String> {
        distribution
            .entries
            .iter()
            .find(|entry| entry.vote_count <= 0.0 && entry.amount != 0.0)
            .map(|entry| format!("zero-vote project {} received {}", entry.project_id, entry.amount))
    }

    /// Exactly the approved views appear
    pub fn approved_only(distribution: &Distribution, views: &[CanonicalProjectView]) -> Option<String> {
        let approved = views.iter().filter(|view| view.approved).count();
        if distribution.entries.len() != approved {
            return Some(format!("{} entries for {} approved projects", distribution.entries.len(), approved));
        }
        None
    }

    /// The largest allocation's share never grows under quadratic weighting
    pub fn quadratic_compresses(linear: &Distribution, quadratic: &Distribution) -> Option<String> {
        if linear.total_weight <= 0.0 || linear.available_for_projects <= 0.0 {
            return None;
        }
        let top = |d: &Distribution| d.entries.first().map(|entry| entry.amount).unwrap_or(0.0);
        let (l, q) = (top(linear), top(quadratic));
        if q > l + REL_TOLERANCE * l.max(1.0) {
            return Some(format!("quadratic top share {} exceeds linear {}", q, l));
        }
        None
    }
}
