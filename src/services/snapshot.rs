use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::api::request_dto::RawDocument;
use crate::api::snapshot_dto::{DatasetDto, SnapshotDto};
use crate::domain::catalog::catalog_trait::{CampaignStore, DatasetCatalog, LocationService, WorkflowSpecService};
use crate::domain::catalog::dataset_info::{DatasetBlocks, EventsLumis};
use crate::domain::planner::workflow_aggregator::PlannerServices;
use crate::domain::site::campaign_policy::CampaignPolicy;
use crate::domain::utils::id::{BlockId, CampaignName, DatasetName, RequestName, SiteName};
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

/// Serves every collaborator from one in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotServices {
    snapshot: SnapshotDto,
}

impl SnapshotServices {
    pub fn new(snapshot: SnapshotDto) -> Self {
        SnapshotServices { snapshot }
    }

    pub fn from_file(file_path: &str) -> Result<Self> {
        let snapshot: SnapshotDto = parse_json_file(file_path)?;
        log::info!(
            "Loaded snapshot '{}': {} workflows, {} datasets, {} campaigns",
            file_path,
            snapshot.workflows.len(),
            snapshot.datasets.len(),
            snapshot.campaigns.len()
        );
        Ok(Self::new(snapshot))
    }

    pub fn into_planner_services(self) -> PlannerServices {
        let shared = Arc::new(self);
        PlannerServices { workflows: shared.clone(), catalog: shared.clone(), locations: shared.clone(), campaigns: shared }
    }

    fn dataset(&self, name: &DatasetName) -> Result<&DatasetDto> {
        self.snapshot.datasets.get(name.as_str()).ok_or_else(|| Error::UnresolvableDataset(name.to_string()))
    }
}

#[async_trait]
impl WorkflowSpecService for SnapshotServices {
    async fn fetch_workflow(&self, name: &RequestName) -> Result<RawDocument> {
        self.snapshot.workflows.get(name.as_str()).cloned().ok_or_else(|| Error::FetchFailed {
            kind: "workflow spec",
            key: name.to_string(),
            reason: "not in snapshot".to_string(),
        })
    }

    /// No entry means no overrides.
    async fn fetch_splitting_spec(&self, name: &RequestName) -> Result<RawDocument> {
        Ok(self.snapshot.splitting_specs.get(name.as_str()).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DatasetCatalog for SnapshotServices {
    async fn resolve_dataset(&self, name: &DatasetName) -> Result<DatasetBlocks> {
        let dataset = self.dataset(name)?;
        Ok(DatasetBlocks {
            blocks: dataset.blocks.iter().map(|b| BlockId::new(b.name.clone())).collect(),
            size_bytes: dataset.blocks.iter().map(|b| b.size_bytes).sum(),
        })
    }

    async fn resolve_events_lumis(&self, name: &DatasetName) -> Result<EventsLumis> {
        let dataset = self.dataset(name)?;
        Ok(EventsLumis { num_events: dataset.num_events.unwrap_or(0), num_lumis: dataset.num_lumis.unwrap_or(0) })
    }

    async fn resolve_parents(&self, name: &DatasetName) -> Result<Vec<DatasetName>> {
        Ok(self.dataset(name)?.parents.iter().map(DatasetName::new).collect())
    }
}

#[async_trait]
impl LocationService for SnapshotServices {
    async fn resolve_block_nodes(&self, dataset: &DatasetName) -> Result<HashMap<BlockId, BTreeSet<SiteName>>> {
        let dataset = self.dataset(dataset)?;
        Ok(dataset
            .blocks
            .iter()
            .map(|b| (BlockId::new(b.name.clone()), b.nodes.iter().map(SiteName::new).collect()))
            .collect())
    }
}

#[async_trait]
impl CampaignStore for SnapshotServices {
    async fn campaign_config(&self, name: &CampaignName) -> Result<Option<CampaignPolicy>> {
        let record = self.snapshot.campaigns.get(name.as_str()).cloned().and_then(|c| c.into_record());
        Ok(record.map(|r| CampaignPolicy::from_dto(name, r)))
    }
}
