#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use workflow_placement::api::request_dto::RawDocument;
use workflow_placement::api::site_dto::SiteDirectoryDto;
use workflow_placement::domain::catalog::catalog_trait::{CampaignStore, DatasetCatalog, LocationService, WorkflowSpecService};
use workflow_placement::domain::catalog::dataset_info::{DatasetBlocks, EventsLumis};
use workflow_placement::domain::planner::workflow_aggregator::PlannerServices;
use workflow_placement::domain::site::campaign_policy::CampaignPolicy;
use workflow_placement::domain::site::site_info::SiteInfo;
use workflow_placement::domain::utils::id::{BlockId, CampaignName, DatasetName, RequestName, SiteName};
use workflow_placement::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct MockDataset {
    pub blocks: Vec<(String, u64, Vec<String>)>,
    pub num_events: u64,
    pub num_lumis: u64,
    pub parents: Vec<String>,
}

/// In-memory stand-in for every external service, counting catalog calls.
#[derive(Debug, Default)]
pub struct MockServices {
    pub workflows: HashMap<String, RawDocument>,
    pub datasets: HashMap<String, MockDataset>,
    pub campaigns: HashMap<String, CampaignPolicy>,
    pub failing_datasets: BTreeSet<String>,
    pub slow_datasets: BTreeSet<String>,
    pub dataset_calls: AtomicUsize,
}

impl MockServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the document as both the request and its workflow.
    pub fn with_workflow(mut self, request: &RawDocument) -> Self {
        let name = request.get("RequestName").and_then(Value::as_str).unwrap_or_default().to_string();
        self.workflows.insert(name, request.clone());
        self
    }

    /// Registers a workflow document that differs from the request.
    pub fn with_workflow_doc(mut self, name: &str, workflow: RawDocument) -> Self {
        self.workflows.insert(name.to_string(), workflow);
        self
    }

    pub fn with_dataset(mut self, name: &str, size_per_block: u64, nodes: &[&str], num_events: u64) -> Self {
        let blocks = (1..=2).map(|i| (format!("{}#{}", name, i), size_per_block, nodes.iter().map(|n| n.to_string()).collect())).collect();
        self.datasets.insert(name.to_string(), MockDataset { blocks, num_events, num_lumis: num_events / 100, parents: Vec::new() });
        self
    }

    pub fn with_parents(mut self, name: &str, parents: &[&str]) -> Self {
        if let Some(dataset) = self.datasets.get_mut(name) {
            dataset.parents = parents.iter().map(|p| p.to_string()).collect();
        }
        self
    }

    pub fn with_campaign(mut self, name: &str, white: &[&str], black: &[&str]) -> Self {
        let policy = CampaignPolicy {
            campaign_name: CampaignName::new(name),
            site_white_list: white.iter().map(|s| SiteName::new(*s)).collect(),
            site_black_list: black.iter().map(|s| SiteName::new(*s)).collect(),
        };
        self.campaigns.insert(name.to_string(), policy);
        self
    }

    pub fn failing(mut self, dataset: &str) -> Self {
        self.failing_datasets.insert(dataset.to_string());
        self
    }

    pub fn slow(mut self, dataset: &str) -> Self {
        self.slow_datasets.insert(dataset.to_string());
        self
    }

    pub fn into_services(self) -> (Arc<MockServices>, PlannerServices) {
        let shared = Arc::new(self);
        let services =
            PlannerServices { workflows: shared.clone(), catalog: shared.clone(), locations: shared.clone(), campaigns: shared.clone() };
        (shared, services)
    }

    async fn lookup(&self, name: &DatasetName) -> Result<&MockDataset> {
        if self.slow_datasets.contains(name.as_str()) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.failing_datasets.contains(name.as_str()) {
            return Err(Error::FetchFailed { kind: "mock", key: name.to_string(), reason: "service unavailable".to_string() });
        }
        self.datasets.get(name.as_str()).ok_or_else(|| Error::UnresolvableDataset(name.to_string()))
    }
}

#[async_trait]
impl WorkflowSpecService for MockServices {
    async fn fetch_workflow(&self, name: &RequestName) -> Result<RawDocument> {
        self.workflows.get(name.as_str()).cloned().ok_or_else(|| Error::FetchFailed {
            kind: "workflow spec",
            key: name.to_string(),
            reason: "unknown request".to_string(),
        })
    }

    async fn fetch_splitting_spec(&self, name: &RequestName) -> Result<RawDocument> {
        Err(Error::FetchFailed { kind: "splitting spec", key: name.to_string(), reason: "no workload cache".to_string() })
    }
}

#[async_trait]
impl DatasetCatalog for MockServices {
    async fn resolve_dataset(&self, name: &DatasetName) -> Result<DatasetBlocks> {
        self.dataset_calls.fetch_add(1, Ordering::SeqCst);
        let dataset = self.lookup(name).await?;
        Ok(DatasetBlocks {
            blocks: dataset.blocks.iter().map(|(b, _, _)| BlockId::new(b.as_str())).collect(),
            size_bytes: dataset.blocks.iter().map(|(_, size, _)| size).sum(),
        })
    }

    async fn resolve_events_lumis(&self, name: &DatasetName) -> Result<EventsLumis> {
        let dataset = self.lookup(name).await?;
        Ok(EventsLumis { num_events: dataset.num_events, num_lumis: dataset.num_lumis })
    }

    async fn resolve_parents(&self, name: &DatasetName) -> Result<Vec<DatasetName>> {
        let dataset = self.lookup(name).await?;
        Ok(dataset.parents.iter().map(|p| DatasetName::new(p.as_str())).collect())
    }
}

#[async_trait]
impl LocationService for MockServices {
    async fn resolve_block_nodes(&self, dataset: &DatasetName) -> Result<HashMap<BlockId, BTreeSet<SiteName>>> {
        let dataset = self.lookup(dataset).await?;
        Ok(dataset
            .blocks
            .iter()
            .map(|(b, _, nodes)| (BlockId::new(b.as_str()), nodes.iter().map(|n| SiteName::new(n.as_str())).collect()))
            .collect())
    }
}

#[async_trait]
impl CampaignStore for MockServices {
    async fn campaign_config(&self, name: &CampaignName) -> Result<Option<CampaignPolicy>> {
        Ok(self.campaigns.get(name.as_str()).cloned())
    }
}

/// Six sites across all tiers.
pub fn site_info() -> Arc<SiteInfo> {
    let dto: SiteDirectoryDto = serde_json::from_value(json!({"sites": [
        {"name": "T1_US_FNAL", "tier": "T1", "cpuPledge": 20000, "ioQuality": "good", "mcoreReady": true,
         "memorySlots": [{"maxMemoryMb": 16000.0, "maxCores": 8}]},
        {"name": "T2_CH_CERN", "tier": "T2", "cpuPledge": 8000, "ioQuality": "good", "wideAreaReadQuality": "good", "mcoreReady": true,
         "memorySlots": [{"maxMemoryMb": 8000.0, "maxCores": 8}]},
        {"name": "T2_DE_DESY", "tier": "T2", "cpuPledge": 3000, "wideAreaReadQuality": "good", "mcoreReady": true,
         "memorySlots": [{"maxMemoryMb": 4000.0, "maxCores": 4}]},
        {"name": "T2_IT_Pisa", "tier": "T2", "cpuPledge": 1500,
         "memorySlots": [{"maxMemoryMb": 1800.0, "maxCores": 1}]},
        {"name": "T3_US_Small", "tier": "T3", "cpuPledge": 200,
         "memorySlots": [{"maxMemoryMb": 2500.0, "maxCores": 1}]},
        {"name": "T2_CH_CERN_EOS", "tier": "EOS", "cpuPledge": 0,
         "memorySlots": [{"maxMemoryMb": 4000.0, "maxCores": 4}]},
    ]}))
    .unwrap();
    Arc::new(SiteInfo::from_dto(dto))
}

pub fn doc(value: Value) -> RawDocument {
    RawDocument::try_from(value).unwrap()
}

pub fn standard_request(name: &str, dataset: &str, campaign: &str) -> RawDocument {
    doc(json!({
        "RequestName": name,
        "RequestType": "Standard",
        "Campaign": campaign,
        "InputDataset": dataset,
        "Memory": 2000,
        "Multicore": 1,
        "TimePerEvent": 36.0,
    }))
}

pub fn sites(names: &[&str]) -> BTreeSet<SiteName> {
    names.iter().map(|n| SiteName::new(*n)).collect()
}
