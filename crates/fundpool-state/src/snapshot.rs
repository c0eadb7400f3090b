//! Versioned campaign snapshots
//!
//! Every refresh builds a complete [`CampaignSnapshot`] and swaps it in whole.
//! Each refresh is tagged with a [`RequestToken`] from a monotonically
//! increasing counter; a result whose token is no longer the latest issued
//! for its campaign is discarded instead of installed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use fundpool_core::{Campaign, CampaignId, ProjectId};

use crate::{rank_projects, CanonicalProjectView, RankedView};

/// Version tag of one refresh request
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// Completeness of the participation data behind a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum DataStatus {
    #[default]
    Complete,
    /// Participation could not be fetched for these projects; they are
    /// shown with zero votes
    Degraded { missing: Vec<ProjectId> },
}

impl DataStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DataStatus::Degraded { .. })
    }
}

/// Immutable reconciled state of one campaign
#[derive(Clone, Debug, PartialEq)]
pub struct CampaignSnapshot {
    pub campaign: Campaign,
    /// Token of the refresh that produced this snapshot
    pub version: u64,
    pub views: Vec<CanonicalProjectView>,
    pub status: DataStatus,
}

impl CampaignSnapshot {
    pub fn new(campaign: Campaign, views: Vec<CanonicalProjectView>, status: DataStatus) -> Self {
        CampaignSnapshot {
            campaign,
            version: 0,
            views,
            status,
        }
    }

    pub fn campaign_id(&self) -> CampaignId {
        self.campaign.id
    }

    /// Ranked views using the campaign's winner limit
    pub fn ranked(&self) -> Vec<RankedView> {
        rank_projects(&self.views, self.campaign.max_winners)
    }

    pub fn approved(&self) -> impl Iterator<Item = &CanonicalProjectView> {
        self.views.iter().filter(|view| view.approved)
    }

    pub fn view(&self, project: ProjectId) -> Option<&CanonicalProjectView> {
        self.views.iter().find(|view| view.project_id == project)
    }
}

/// Result of offering a snapshot to the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { version: u64 },
    /// A newer request was issued for the campaign; the snapshot was dropped
    Superseded { token: RequestToken, latest: RequestToken },
}

#[derive(Debug, Default)]
struct Slot {
    latest: u64,
    current: Option<Arc<CampaignSnapshot>>,
}

/// Holds the current snapshot of every loaded campaign
#[derive(Debug, Default)]
pub struct SnapshotStore {
    next_token: u64,
    slots: HashMap<CampaignId, Slot>,
}

/// Thread-safe handle to a [`SnapshotStore`]
#[derive(Clone, Debug, Default)]
pub struct SharedSnapshots {
    inner: Arc<RwLock<SnapshotStore>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore::default()
    }

    /// Issue a new token for a campaign, superseding any earlier one
    pub fn issue(&mut self, campaign: CampaignId) -> RequestToken {
        self.next_token += 1;
        let token = self.next_token;
        self.slots.entry(campaign).or_default().latest = token;
        RequestToken(token)
    }

    pub fn is_latest(&self, campaign: CampaignId, token: RequestToken) -> bool {
        self.slots
            .get(&campaign)
            .map(|slot| slot.latest == token.0)
            .unwrap_or(false)
    }

    /// Install a snapshot if `token` is still the latest for its campaign
    pub fn install(&mut self, token: RequestToken, mut snapshot: CampaignSnapshot) -> InstallOutcome {
        let campaign = snapshot.campaign_id();
        let slot = self.slots.entry(campaign).or_default();
        if slot.latest != token.0 {
            return InstallOutcome::Superseded {
                token,
                latest: RequestToken(slot.latest),
            };
        }
        snapshot.version = token.0;
        slot.current = Some(Arc::new(snapshot));
        InstallOutcome::Installed { version: token.0 }
    }

    pub fn get(&self, campaign: CampaignId) -> Option<Arc<CampaignSnapshot>> {
        self.slots.get(&campaign).and_then(|slot| slot.current.clone())
    }

    /// Number of campaigns with an installed snapshot
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| slot.current.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedSnapshots {
    pub fn new() -> Self {
        SharedSnapshots::default()
    }

    pub fn issue(&self, campaign: CampaignId) -> RequestToken {
        self.inner.write().issue(campaign)
    }

    pub fn is_latest(&self, campaign: CampaignId, token: RequestToken) -> bool {
        self.inner.read().is_latest(campaign, token)
    }

    pub fn install(&self, token: RequestToken, snapshot: CampaignSnapshot) -> InstallOutcome {
        self.inner.write().install(token, snapshot)
    }

    pub fn get(&self, campaign: CampaignId) -> Option<Arc<CampaignSnapshot>> {
        self.inner.read().get(campaign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundpool_core::TokenAmount;

    fn snapshot(campaign: u64, votes: u64) -> CampaignSnapshot {
        let view = CanonicalProjectView {
            project_id: ProjectId(1),
            name: "P1".to_string(),
            approved: true,
            vote_count: TokenAmount::from_tokens(votes),
            funds_received: TokenAmount::ZERO,
            position: 0,
        };
        CampaignSnapshot::new(
            Campaign::placeholder(CampaignId(campaign)),
            vec![view],
            DataStatus::Complete,
        )
    }

    #[test]
    fn test_install_latest() {
        let mut store = SnapshotStore::new();
        let token = store.issue(CampaignId(1));

        let outcome = store.install(token, snapshot(1, 10));

        assert_eq!(outcome, InstallOutcome::Installed { version: token.0 });
        assert_eq!(store.get(CampaignId(1)).map(|s| s.version), Some(token.0));
    }

    #[test]
    fn test_superseded_response_discarded() {
        let mut store = SnapshotStore::new();
        let old = store.issue(CampaignId(1));
        let new = store.issue(CampaignId(1));

        assert_eq!(store.install(new, snapshot(1, 20)), InstallOutcome::Installed { version: new.0 });
        let outcome = store.install(old, snapshot(1, 10));

        assert_eq!(outcome, InstallOutcome::Superseded { token: old, latest: new });
        let current = store.get(CampaignId(1)).map(|s| s.views[0].vote_count);
        assert_eq!(current, Some(TokenAmount::from_tokens(20)));
    }

    #[test]
    fn test_tokens_are_per_campaign() {
        let mut store = SnapshotStore::new();
        let a = store.issue(CampaignId(1));
        let b = store.issue(CampaignId(2));

        assert!(b > a);
        assert!(store.is_latest(CampaignId(1), a));
        assert!(store.is_latest(CampaignId(2), b));
        assert_eq!(store.install(a, snapshot(1, 1)), InstallOutcome::Installed { version: a.0 });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_old_snapshot_arc_survives_swap() {
        let shared = SharedSnapshots::new();
        let first = shared.issue(CampaignId(7));
        shared.install(first, snapshot(7, 1));
        let held = shared.get(CampaignId(7)).unwrap();

        let second = shared.issue(CampaignId(7));
        shared.install(second, snapshot(7, 2));

        assert_eq!(held.version, first.0);
        assert_eq!(held.views[0].vote_count, TokenAmount::from_tokens(1));
        assert_eq!(shared.get(CampaignId(7)).map(|s| s.version), Some(second.0));
    }

    #[test]
    fn test_unknown_campaign() {
        let store = SnapshotStore::new();
        assert!(store.get(CampaignId(99)).is_none());
        assert!(!store.is_latest(CampaignId(99), RequestToken(1)));
        assert!(store.is_empty());
    }
}
