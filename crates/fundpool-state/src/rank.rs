//! Competition ranking of approved projects
//!
//! Ties share a rank; the next distinct vote count takes its 1-indexed list
//! position, so ranks skip after a tie group (`[300, 300, 100]` → `[1, 1, 3]`).

use std::cmp::Reverse;

use crate::CanonicalProjectView;

/// Placeholder shown for projects without a rank
pub const UNRANKED_LABEL: &str = "—";

/// A canonical view annotated with its rank
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedView {
    pub view: CanonicalProjectView,
    /// `None` for unapproved projects
    pub rank: Option<u32>,
    /// Ranked within the campaign's winner limit
    pub is_winner: bool,
}

impl RankedView {
    pub fn rank_label(&self) -> String {
        match self.rank {
            Some(rank) => format!("#{}", rank),
            None => UNRANKED_LABEL.to_string(),
        }
    }
}

/// Assign competition ranks to a list already sorted by descending votes
pub fn assign_ranks(sorted: &[CanonicalProjectView]) -> Vec<u32> {
    let mut ranks: Vec<u32> = Vec::with_capacity(sorted.len());
    for (i, view) in sorted.iter().enumerate() {
        let rank = match ranks.last() {
            Some(&previous) if sorted[i - 1].vote_count == view.vote_count => previous,
            Some(_) => (i + 1) as u32,
            None => 1,
        };
        ranks.push(rank);
    }
    ranks
}

/// Rank a campaign's canonical views.
///
/// Approved projects come first, sorted by descending vote count with the
/// project-list position as the tie-break, each carrying a rank. Unapproved
/// projects follow in list order with no rank. `max_winners == 0` means every
/// ranked project counts as a winner.
pub fn rank_projects(views: &[CanonicalProjectView], max_winners: u32) -> Vec<RankedView> {
    let (mut approved, mut unapproved): (Vec<_>, Vec<_>) =
        views.iter().cloned().partition(|view| view.approved);

    approved.sort_by_key(|view| (Reverse(view.vote_count), view.position));
    let ranks = assign_ranks(&approved);

    let mut ranked: Vec<RankedView> = approved
        .into_iter()
        .zip(ranks)
        .map(|(view, rank)| RankedView {
            view,
            rank: Some(rank),
            is_winner: max_winners == 0 || rank <= max_winners,
        })
        .collect();

    unapproved.sort_by_key(|view| view.position);
    ranked.extend(unapproved.into_iter().map(|view| RankedView {
        view,
        rank: None,
        is_winner: false,
    }));

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundpool_core::{ProjectId, TokenAmount};
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

    fn ranks_of(ranked: &[RankedView]) -> Vec<Option<u32>> {
        ranked.iter().map(|r| r.rank).collect()
    }

    #[test]
    fn test_tie_skips_next_rank() {
        let views = vec![view(0, true, 300), view(1, true, 300), view(2, true, 100)];
        let ranked = rank_projects(&views, 0);
        assert_eq!(ranks_of(&ranked), vec![Some(1), Some(1), Some(3)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_projects(&[], 0).is_empty());
        assert!(assign_ranks(&[]).is_empty());
    }

    #[test]
    fn test_all_equal() {
        let views: Vec<_> = (0..5).map(|i| view(i, true, 42)).collect();
        let ranked = rank_projects(&views, 0);
        assert!(ranked.iter().all(|r| r.rank == Some(1)));
    }

    #[test]
    fn test_sorts_descending_with_position_tiebreak() {
        let views = vec![view(0, true, 10), view(1, true, 50), view(2, true, 10), view(3, true, 70)];
        let ranked = rank_projects(&views, 0);
        let ids: Vec<_> = ranked.iter().map(|r| r.view.project_id.0).collect();
        assert_eq!(ids, vec![3, 1, 0, 2]);
        assert_eq!(ranks_of(&ranked), vec![Some(1), Some(2), Some(3), Some(3)]);
    }

    #[test]
    fn test_unapproved_never_ranked() {
        let views = vec![view(0, false, 900), view(1, true, 5), view(2, false, 0)];
        let ranked = rank_projects(&views, 0);

        assert_eq!(ranked[0].view.project_id, ProjectId(1));
        assert_eq!(ranked[0].rank, Some(1));
        assert_eq!(ranked[1].rank, None);
        assert_eq!(ranked[2].rank, None);
        assert_eq!(ranked[1].rank_label(), UNRANKED_LABEL);
        assert!(!ranked[1].is_winner);
    }

    #[test]
    fn test_winner_limit() {
        let views = vec![view(0, true, 30), view(1, true, 20), view(2, true, 20), view(3, true, 10)];
        let ranked = rank_projects(&views, 2);
        let winners: Vec<_> = ranked.iter().map(|r| r.is_winner).collect();
        // Tie at rank 2 keeps both in
        assert_eq!(winners, vec![true, true, true, false]);
        assert_eq!(ranked[0].rank_label(), "#1");
    }

    proptest! {
        #[test]
        fn prop_distinct_votes_give_distinct_ranks(votes in proptest::collection::hash_set(1u64..1_000_000, 0..40)) {
            let views: Vec<_> = votes.iter().enumerate().map(|(i, v)| view(i as u64, true, *v)).collect();
            let ranked = rank_projects(&views, 0);
            for (i, r) in ranked.iter().enumerate() {
                prop_assert_eq!(r.rank, Some(i as u32 + 1));
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].view.vote_count > pair[1].view.vote_count);
            }
        }

        #[test]
        fn prop_rank_never_exceeds_position(votes in proptest::collection::vec(0u64..5, 0..40)) {
            let views: Vec<_> = votes.iter().enumerate().map(|(i, v)| view(i as u64, true, *v)).collect();
            let ranked = rank_projects(&views, 0);
            for (i, r) in ranked.iter().enumerate() {
                let rank = r.rank.unwrap_or(0);
                prop_assert!(rank >= 1 && rank as usize <= i + 1);
            }
        }
    }
}
