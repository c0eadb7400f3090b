//! Chain-access boundary
//!
//! Contract reads and transaction submission live behind [`ChainAccess`].
//! Transport, wallets and signing belong to the implementor.

use async_trait::async_trait;

use fundpool_core::{Campaign, CampaignId, ChainError, Project, ProjectId, RawParticipation};

/// Receipt of a submitted transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
}

impl TxReceipt {
    pub fn new(tx_hash: impl Into<String>) -> Self {
        TxReceipt {
            tx_hash: tx_hash.into(),
        }
    }
}

/// Contract reads and writes consumed by the campaign service
#[async_trait]
pub trait ChainAccess: Send + Sync {
    async fn read_campaign(&self, campaign: CampaignId) -> Result<Campaign, ChainError>;

    async fn read_all_projects(&self) -> Result<Vec<Project>, ChainError>;

    /// Raw ids of the projects enrolled in a campaign, in enrolment order.
    /// Without a membership query every known project is enrolled.
    async fn read_campaign_project_ids(&self, _campaign: CampaignId) -> Result<Vec<String>, ChainError> {
        Ok(self
            .read_all_projects()
            .await?
            .into_iter()
            .map(|project| project.id)
            .collect())
    }

    async fn read_approved_project_ids(&self, campaign: CampaignId) -> Result<Vec<String>, ChainError>;

    /// One entry per requested project, `None` where that project's read failed
    async fn read_participation_batch(
        &self,
        campaign: CampaignId,
        projects: &[ProjectId],
    ) -> Result<Vec<Option<RawParticipation>>, ChainError>;

    async fn submit_approval(&self, campaign: CampaignId, project: ProjectId) -> Result<TxReceipt, ChainError>;

    async fn submit_distribution(&self, campaign: CampaignId) -> Result<TxReceipt, ChainError>;
}
