//! Participation reconciliation
//!
//! Merges the campaign's project list, the authoritative approved-id set and
//! whatever participation records arrived into one canonical view per
//! project. Approval comes from the approved-id set only; the raw flag on a
//! participation record is ignored.

use std::collections::{HashMap, HashSet};

use fundpool_core::{ApprovedIdSet, ParticipationRecord, Project, ProjectId, TokenAmount};

/// Reconciled, authoritative view of one project in one campaign
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalProjectView {
    pub project_id: ProjectId,
    pub name: String,
    /// Resolved from the approved-id set
    pub approved: bool,
    pub vote_count: TokenAmount,
    pub funds_received: TokenAmount,
    /// Position in the campaign project list; secondary sort key for ties
    pub position: usize,
}

/// Output of a reconciliation pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub views: Vec<CanonicalProjectView>,
    /// Projects dropped for an unparsable or repeated id
    pub excluded: u32,
    /// Projects with no participation record, defaulted to zero
    pub defaulted: u32,
}

/// Reconcile one campaign. Total: never fails, safe to call on every refresh.
pub fn reconcile(
    projects: &[Project],
    approved: &ApprovedIdSet,
    participation: &HashMap<ProjectId, ParticipationRecord>,
) -> ReconciliationResult {
    let mut result = ReconciliationResult::default();
    let mut seen = HashSet::with_capacity(projects.len());

    for project in projects {
        let Some(project_id) = ProjectId::parse(&project.id) else {
            tracing::debug!(raw_id = %project.id, "excluding project with unparsable id");
            result.excluded += 1;
            continue;
        };
        if !seen.insert(project_id) {
            tracing::debug!(project = %project_id, "excluding repeated project id");
            result.excluded += 1;
            continue;
        }

        let record = match participation.get(&project_id) {
            Some(record) => *record,
            None => {
                result.defaulted += 1;
                ParticipationRecord::default()
            }
        };

        let position = result.views.len();
        result.views.push(CanonicalProjectView {
            project_id,
            name: project.name.clone(),
            approved: approved.contains(project_id),
            vote_count: record.vote_count,
            funds_received: record.funds_received,
            position,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(approved: bool, votes: u64) -> ParticipationRecord {
        ParticipationRecord {
            approved,
            vote_count: TokenAmount::from_tokens(votes),
            funds_received: TokenAmount::from_tokens(votes / 2),
        }
    }

    #[test]
    fn test_approval_comes_from_set() {
        let projects = vec![Project::new("1", "Alpha"), Project::new("2", "Beta")];
        let approved = ApprovedIdSet::from_raw(["1"]);
        let mut participation = HashMap::new();
        participation.insert(ProjectId(1), record(false, 10));
        participation.insert(ProjectId(2), record(true, 20));

        let result = reconcile(&projects, &approved, &participation);

        assert!(result.views[0].approved);
        assert!(!result.views[1].approved);
    }

    #[test]
    fn test_missing_participation_defaults_to_zero() {
        let projects = vec![Project::new("5", "Gamma")];
        let approved = ApprovedIdSet::from_raw(["5"]);

        let result = reconcile(&projects, &approved, &HashMap::new());

        assert_eq!(result.views.len(), 1);
        assert_eq!(result.defaulted, 1);
        let view = &result.views[0];
        assert!(view.approved);
        assert_eq!(view.vote_count, TokenAmount::ZERO);
        assert_eq!(view.funds_received, TokenAmount::ZERO);
    }

    #[test]
    fn test_unparsable_ids_excluded() {
        let projects = vec![
            Project::new("oops", "Bad"),
            Project::new("3", "Good"),
            Project::new("3", "Dup"),
        ];

        let result = reconcile(&projects, &ApprovedIdSet::new(), &HashMap::new());

        assert_eq!(result.views.len(), 1);
        assert_eq!(result.excluded, 2);
        assert_eq!(result.views[0].name, "Good");
        assert_eq!(result.views[0].position, 0);
    }

    #[test]
    fn test_one_view_per_project_in_order() {
        let projects: Vec<_> = (0..10).map(|i| Project::new(i.to_string(), format!("P{}", i))).collect();

        let result = reconcile(&projects, &ApprovedIdSet::new(), &HashMap::new());

        assert_eq!(result.views.len(), projects.len());
        for (i, view) in result.views.iter().enumerate() {
            assert_eq!(view.project_id, ProjectId(i as u64));
            assert_eq!(view.position, i);
        }
    }
}
