//! Campaign, project and participation records
//!
//! These are read-only inputs owned by the chain. Participation arrives in
//! more than one shape depending on which contract call produced it; it is
//! normalised into [`ParticipationRecord`] before anything else looks at it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{CampaignId, ProjectId, RawAmount, TokenAmount};

/// How a campaign intends to split its pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    #[default]
    Linear,
    Quadratic,
    Custom,
}

/// Weighting applied by the distribution calculator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightingMode {
    /// weight = votes
    Linear,
    /// weight = sqrt(votes)
    Quadratic,
}

impl DistributionMode {
    /// Weighting for automatic distribution; custom campaigns have none
    pub fn weighting(self) -> Option<WeightingMode> {
        match self {
            DistributionMode::Linear => Some(WeightingMode::Linear),
            DistributionMode::Quadratic => Some(WeightingMode::Quadratic),
            DistributionMode::Custom => None,
        }
    }

    /// Decode the on-chain discriminant (0 linear, 1 quadratic, 2 custom)
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DistributionMode::Linear),
            1 => Some(DistributionMode::Quadratic),
            2 => Some(DistributionMode::Custom),
            _ => None,
        }
    }
}

/// Campaign as read from chain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub description: String,
    /// Unix seconds; `None` until the campaign has been read
    pub start_time: Option<u64>,
    /// Unix seconds; `None` until the campaign has been read
    pub end_time: Option<u64>,
    pub total_funds: TokenAmount,
    /// 0-100
    pub admin_fee_percentage: u64,
    /// 0 means no limit
    pub max_winners: u32,
    pub distribution_mode: DistributionMode,
    pub active: bool,
}

impl Campaign {
    /// Campaign with only an id set, used before the first read lands
    pub fn placeholder(id: CampaignId) -> Self {
        Campaign {
            id,
            name: String::new(),
            description: String::new(),
            start_time: None,
            end_time: None,
            total_funds: TokenAmount::ZERO,
            admin_fee_percentage: 0,
            max_winners: 0,
            distribution_mode: DistributionMode::default(),
            active: false,
        }
    }
}

/// Project as read from chain. The id is kept raw; parsing happens at
/// reconciliation, where unparsable projects are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Project {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            owner: String::new(),
        }
    }
}

/// Normalised participation of one project in one campaign
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParticipationRecord {
    /// Raw approval flag. May be stale; never authoritative.
    pub approved: bool,
    pub vote_count: TokenAmount,
    pub funds_received: TokenAmount,
}

/// Participation in any of the shapes contract readers return
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawParticipation {
    /// `[approved, voteCount, fundsReceived]`
    Tuple(bool, RawAmount, RawAmount),
    /// `{ approved?, voteCount?, fundsReceived? }`
    Fields {
        approved: Option<bool>,
        vote_count: Option<RawAmount>,
        funds_received: Option<RawAmount>,
    },
}

impl RawParticipation {
    /// Collapse into the single normalised shape
    pub fn normalize(&self) -> ParticipationRecord {
        match self {
            RawParticipation::Tuple(approved, votes, funds) => ParticipationRecord {
                approved: *approved,
                vote_count: TokenAmount::parse_lenient(votes),
                funds_received: TokenAmount::parse_lenient(funds),
            },
            RawParticipation::Fields {
                approved,
                vote_count,
                funds_received,
            } => ParticipationRecord {
                approved: approved.unwrap_or(false),
                vote_count: vote_count
                    .as_ref()
                    .map(TokenAmount::parse_lenient)
                    .unwrap_or_default(),
                funds_received: funds_received
                    .as_ref()
                    .map(TokenAmount::parse_lenient)
                    .unwrap_or_default(),
            },
        }
    }
}

impl From<ParticipationRecord> for RawParticipation {
    fn from(record: ParticipationRecord) -> Self {
        RawParticipation::Tuple(
            record.approved,
            record.vote_count.into(),
            record.funds_received.into(),
        )
    }
}

/// Authoritative set of project ids approved for a campaign
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovedIdSet {
    ids: HashSet<ProjectId>,
}

impl ApprovedIdSet {
    pub fn new() -> Self {
        ApprovedIdSet::default()
    }

    /// Build from raw ids; unparsable entries are skipped
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ApprovedIdSet {
            ids: raw
                .into_iter()
                .filter_map(|s| ProjectId::parse(s.as_ref()))
                .collect(),
        }
    }

    pub fn insert(&mut self, id: ProjectId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: ProjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ProjectId> for ApprovedIdSet {
    fn from_iter<T: IntoIterator<Item = ProjectId>>(iter: T) -> Self {
        ApprovedIdSet {
            ids: iter.into_iter().collect(),
        }
    }
}
