use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

use crate::api::request_dto::RawDocument;
use crate::domain::catalog::dataset_info::{DatasetBlocks, EventsLumis};
use crate::domain::site::campaign_policy::CampaignPolicy;
use crate::domain::utils::id::{BlockId, CampaignName, DatasetName, RequestName, SiteName};
use crate::error::Result;

/// Request manager: full workflow documents and their workload specs.
#[async_trait]
pub trait WorkflowSpecService: Send + Sync {
    async fn fetch_workflow(&self, name: &RequestName) -> Result<RawDocument>;

    /// Workload spec holding the task splitting parameters.
    async fn fetch_splitting_spec(&self, name: &RequestName) -> Result<RawDocument>;
}

#[async_trait]
pub trait DatasetCatalog: Send + Sync {
    async fn resolve_dataset(&self, name: &DatasetName) -> Result<DatasetBlocks>;

    async fn resolve_events_lumis(&self, name: &DatasetName) -> Result<EventsLumis>;

    async fn resolve_parents(&self, name: &DatasetName) -> Result<Vec<DatasetName>>;
}

/// Data location service: which storage nodes hold each block of a dataset.
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn resolve_block_nodes(&self, dataset: &DatasetName) -> Result<HashMap<BlockId, BTreeSet<SiteName>>>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// `Ok(None)` when no configuration exists for the campaign.
    async fn campaign_config(&self, name: &CampaignName) -> Result<Option<CampaignPolicy>>;
}
