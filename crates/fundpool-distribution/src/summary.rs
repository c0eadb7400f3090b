//! Campaign summary figures

use serde::{Deserialize, Serialize};

use fundpool_core::TokenAmount;
use fundpool_state::CampaignSnapshot;

use crate::FeeSchedule;

/// Headline numbers for one campaign snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub project_count: usize,
    pub approved_count: usize,
    /// Votes across approved projects only
    pub total_votes: TokenAmount,
    pub total_funds: TokenAmount,
    pub available_for_projects: TokenAmount,
}

pub fn summarize(snapshot: &CampaignSnapshot, fees: FeeSchedule) -> CampaignSummary {
    let approved_count = snapshot.approved().count();
    let total_votes = snapshot.approved().map(|view| view.vote_count).sum();
    CampaignSummary {
        project_count: snapshot.views.len(),
        approved_count,
        total_votes,
        total_funds: snapshot.campaign.total_funds,
        available_for_projects: fees.available_for_projects(snapshot.campaign.total_funds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundpool_core::{Campaign, CampaignId, ProjectId};
    use fundpool_state::{CanonicalProjectView, DataStatus};

    #[test]
    fn test_summary_counts_approved_votes_only() {
        let mut campaign = Campaign::placeholder(CampaignId(1));
        campaign.total_funds = TokenAmount::from_tokens(1000);
        campaign.admin_fee_percentage = 5;
        let views = (0..4)
            .map(|i| CanonicalProjectView {
                project_id: ProjectId(i),
                name: format!("P{}", i),
                approved: i % 2 == 0,
                vote_count: TokenAmount::from_tokens(10),
                funds_received: TokenAmount::ZERO,
                position: i as usize,
            })
            .collect();
        let snapshot = CampaignSnapshot::new(campaign, views, DataStatus::Complete);

        let summary = summarize(&snapshot, FeeSchedule::with_admin(5));

        assert_eq!(summary.project_count, 4);
        assert_eq!(summary.approved_count, 2);
        assert_eq!(summary.total_votes, TokenAmount::from_tokens(20));
        assert_eq!(summary.available_for_projects, TokenAmount::from_tokens(800));
    }
}
