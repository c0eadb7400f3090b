//! Identity types for fundpool
//!
//! Campaigns and projects are numbered on chain. The chain hands ids back as
//! strings, so parsing is lenient about format and strict about content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FundpoolError;

/// Campaign identity - index of the campaign on chain
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CampaignId(pub u64);

impl CampaignId {
    #[inline]
    pub fn new(id: u64) -> Self {
        CampaignId(id)
    }

    /// Parse a raw campaign id (decimal or `0x` hex)
    pub fn parse(raw: &str) -> Option<Self> {
        parse_u64(raw).map(CampaignId)
    }
}

impl fmt::Debug for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Campaign({})", self.0)
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Project identity - index of the project on chain
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

impl ProjectId {
    #[inline]
    pub fn new(id: u64) -> Self {
        ProjectId(id)
    }

    /// Parse a raw project id (decimal or `0x` hex).
    /// Returns `None` for anything else; callers exclude such projects.
    pub fn parse(raw: &str) -> Option<Self> {
        parse_u64(raw).map(ProjectId)
    }
}

impl FromStr for ProjectId {
    type Err = FundpoolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ProjectId::parse(raw).ok_or_else(|| FundpoolError::InvalidProjectId(raw.to_string()))
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Project({})", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_u64(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() {
            return None;
        }
        return u64::from_str_radix(hex, 16).ok();
    }
    // from_str accepts a leading '+', ids never carry one
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
