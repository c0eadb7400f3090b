//! Distribution calculator
//!
//! Splits the post-fee pool among approved projects by weight:
//! - Linear: weight = votes
//! - Quadratic: weight = sqrt(votes)
//!
//! Votes are converted to decimal units (÷10^18) before weighting so the
//! square root is taken of token amounts, not raw integers. Nothing is
//! rounded here; see [`crate::display`] for presentation rounding.

use serde::{Deserialize, Serialize};

use fundpool_core::{ProjectId, TokenAmount, WeightingMode};
use fundpool_state::{CampaignSnapshot, CanonicalProjectView};

use crate::{FeeSchedule, PLATFORM_FEE_PERCENT};

/// Allocation for one project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub project_id: ProjectId,
    pub project_name: String,
    /// Decimal vote total
    pub vote_count: f64,
    pub weight: f64,
    pub amount: f64,
    /// Share of the available pool, 0-100
    pub percentage: f64,
}

/// Full distribution of one campaign pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mode: WeightingMode,
    pub fees: FeeSchedule,
    /// Decimal pool after fees
    pub available_for_projects: f64,
    pub total_weight: f64,
    /// Sorted by descending amount; ties keep project-list order
    pub entries: Vec<DistributionEntry>,
}

impl Distribution {
    /// No votes or no pool: every amount is zero
    pub fn is_degenerate(&self) -> bool {
        self.total_weight <= 0.0 || self.available_for_projects <= 0.0
    }

    pub fn total_amount(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    pub fn entry(&self, project: ProjectId) -> Option<&DistributionEntry> {
        self.entries.iter().find(|entry| entry.project_id == project)
    }
}

/// Weight of a decimal vote total under a weighting mode.
/// Non-finite or non-positive input weighs zero.
pub fn weight_of(votes: f64, mode: WeightingMode) -> f64 {
    if !votes.is_finite() || votes <= 0.0 {
        return 0.0;
    }
    match mode {
        WeightingMode::Linear => votes,
        WeightingMode::Quadratic => votes.sqrt(),
    }
}

/// Compute the distribution of `total_funds` among the approved views.
///
/// Unapproved views are skipped. Zero-vote approved projects stay in the
/// output with a zero amount. Total: never panics, never divides by zero.
pub fn compute_distribution(
    views: &[CanonicalProjectView],
    total_funds: TokenAmount,
    fees: FeeSchedule,
    mode: WeightingMode,
) -> Distribution {
    let available = fees.available_for_projects(total_funds).to_decimal();

    let mut entries: Vec<DistributionEntry> = views
        .iter()
        .filter(|view| view.approved)
        .map(|view| {
            let votes = view.vote_count.to_decimal();
            DistributionEntry {
                project_id: view.project_id,
                project_name: view.name.clone(),
                vote_count: votes,
                weight: weight_of(votes, mode),
                amount: 0.0,
                percentage: 0.0,
            }
        })
        .collect();

    let total_weight: f64 = entries.iter().map(|entry| entry.weight).sum();

    if total_weight > 0.0 && total_weight.is_finite() {
        for entry in entries.iter_mut() {
            let share = entry.weight / total_weight;
            entry.amount = share * available;
            entry.percentage = if fees.is_degenerate() { 0.0 } else { share * 100.0 };
        }
    } else {
        tracing::debug!(projects = entries.len(), "no votes cast; distribution is all zero");
        for entry in entries.iter_mut() {
            entry.weight = 0.0;
        }
    }

    // Stable: equal amounts keep project-list order
    entries.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    Distribution {
        mode,
        fees,
        available_for_projects: available,
        total_weight: if total_weight.is_finite() { total_weight } else { 0.0 },
        entries,
    }
}

/// Distribution calculator bound to a platform fee
#[derive(Clone, Copy, Debug)]
pub struct DistributionCalculator {
    platform_fee_percent: u64,
}

impl DistributionCalculator {
    pub fn new() -> Self {
        Self::with_platform_fee(PLATFORM_FEE_PERCENT)
    }

    pub fn with_platform_fee(platform_fee_percent: u64) -> Self {
        DistributionCalculator {
            platform_fee_percent: platform_fee_percent.min(100),
        }
    }

    pub fn platform_fee_percent(&self) -> u64 {
        self.platform_fee_percent
    }

    /// Fees for a campaign snapshot
    pub fn fees_for(&self, snapshot: &CampaignSnapshot) -> FeeSchedule {
        FeeSchedule::new(self.platform_fee_percent, snapshot.campaign.admin_fee_percentage)
    }

    /// Distribute a snapshot's pool
    pub fn compute(&self, snapshot: &CampaignSnapshot, mode: WeightingMode) -> Distribution {
        compute_distribution(
            &snapshot.views,
            snapshot.campaign.total_funds,
            self.fees_for(snapshot),
            mode,
        )
    }
}

impl Default for DistributionCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn view(id: u64, approved: bool, votes: u64) -> CanonicalProjectView {
        CanonicalProjectView {
            project_id: ProjectId(id),
            name: format!("P{}", id),
            approved,
            vote_count: TokenAmount::from_tokens(votes),
            funds_received: TokenAmount::ZERO,
            position: id as usize,
        }
    }

    fn approved(votes: &[u64]) -> Vec<CanonicalProjectView> {
        votes.iter().enumerate().map(|(i, v)| view(i as u64, true, *v)).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_linear_scenario_after_fees() {
        let dist = compute_distribution(
            &approved(&[300, 100]),
            TokenAmount::from_tokens(1000),
            FeeSchedule::with_admin(5),
            WeightingMode::Linear,
        );

        assert!(close(dist.available_for_projects, 800.0));
        assert!(close(dist.entries[0].amount, 600.0));
        assert!(close(dist.entries[1].amount, 200.0));
        assert!(close(dist.entries[0].percentage, 75.0));
    }

    #[test]
    fn test_linear_vs_quadratic() {
        let views = approved(&[400, 100, 100]);
        let pool = TokenAmount::from_tokens(1000);
        let fees = FeeSchedule::new(0, 0);

        let linear = compute_distribution(&views, pool, fees, WeightingMode::Linear);
        let quadratic = compute_distribution(&views, pool, fees, WeightingMode::Quadratic);

        assert!(close(linear.entries[0].percentage, 200.0 / 3.0));
        assert!(close(linear.entries[1].percentage, 50.0 / 3.0));

        let weights: Vec<_> = quadratic.entries.iter().map(|e| e.weight).collect();
        assert!(close(weights[0], 20.0) && close(weights[1], 10.0) && close(weights[2], 10.0));
        assert!(close(quadratic.entries[0].percentage, 50.0));
        assert!(close(quadratic.entries[1].percentage, 25.0));
        assert!(quadratic.entries[0].percentage < linear.entries[0].percentage);
    }

    #[test]
    fn test_no_votes_is_all_zero() {
        let dist = compute_distribution(
            &approved(&[0, 0, 0]),
            TokenAmount::from_tokens(1000),
            FeeSchedule::default(),
            WeightingMode::Quadratic,
        );

        assert_eq!(dist.entries.len(), 3);
        assert!(dist.is_degenerate());
        assert!(dist.entries.iter().all(|e| e.amount == 0.0 && e.percentage == 0.0 && e.weight == 0.0));
    }

    #[test]
    fn test_degenerate_fees_zero_amounts_and_percentages() {
        let dist = compute_distribution(
            &approved(&[10, 20]),
            TokenAmount::from_tokens(1000),
            FeeSchedule::with_admin(90),
            WeightingMode::Linear,
        );

        assert_eq!(dist.available_for_projects, 0.0);
        assert!(dist.entries.iter().all(|e| e.amount == 0.0 && e.percentage == 0.0));
    }

    #[test]
    fn test_zero_vote_projects_kept() {
        let dist = compute_distribution(
            &approved(&[0, 50]),
            TokenAmount::from_tokens(100),
            FeeSchedule::new(0, 0),
            WeightingMode::Linear,
        );

        assert_eq!(dist.entries.len(), 2);
        assert_eq!(dist.entries[0].project_id, ProjectId(1));
        assert_eq!(dist.entries[1].project_id, ProjectId(0));
        assert_eq!(dist.entries[1].amount, 0.0);
    }

    #[test]
    fn test_unapproved_excluded() {
        let views = vec![view(0, false, 1_000), view(1, true, 10)];
        let dist = compute_distribution(
            &views,
            TokenAmount::from_tokens(100),
            FeeSchedule::new(0, 0),
            WeightingMode::Linear,
        );

        assert!(dist.entry(ProjectId(0)).is_none());
        assert!(close(dist.entries[0].amount, 100.0));
    }

    #[test]
    fn test_ties_keep_list_order() {
        let dist = compute_distribution(
            &approved(&[5, 9, 5, 5]),
            TokenAmount::from_tokens(24),
            FeeSchedule::new(0, 0),
            WeightingMode::Linear,
        );

        let ids: Vec<_> = dist.entries.iter().map(|e| e.project_id.0).collect();
        assert_eq!(ids, vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_quadratic_uses_decimal_votes() {
        // 4 tokens → weight 2, not sqrt(4e18)
        let dist = compute_distribution(
            &approved(&[4]),
            TokenAmount::from_tokens(10),
            FeeSchedule::new(0, 0),
            WeightingMode::Quadratic,
        );
        assert!(close(dist.entries[0].weight, 2.0));
    }

    #[test]
    fn test_weight_of_guards() {
        assert_eq!(weight_of(f64::NAN, WeightingMode::Quadratic), 0.0);
        assert_eq!(weight_of(-4.0, WeightingMode::Quadratic), 0.0);
        assert_eq!(weight_of(f64::INFINITY, WeightingMode::Linear), 0.0);
    }

    proptest! {
        #[test]
        fn prop_amounts_sum_to_available(
            votes in proptest::collection::vec(0u64..10_000_000, 1..50),
            pool in 1u64..1_000_000_000,
            admin in 0u64..=85,
            quadratic in any::<bool>(),
        ) {
            let mode = if quadratic { WeightingMode::Quadratic } else { WeightingMode::Linear };
            let dist = compute_distribution(
                &approved(&votes),
                TokenAmount::from_tokens(pool),
                FeeSchedule::with_admin(admin),
                mode,
            );

            if dist.total_weight > 0.0 {
                let total = dist.total_amount();
                prop_assert!((total - dist.available_for_projects).abs()
                    <= 1e-6 * dist.available_for_projects.max(1e-12));
            } else {
                prop_assert!(dist.entries.iter().all(|e| e.amount == 0.0));
            }
            for pair in dist.entries.windows(2) {
                prop_assert!(pair[0].amount >= pair[1].amount);
            }
        }
    }
}
