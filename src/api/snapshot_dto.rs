use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::campaign_dto::CampaignConfigDto;
use crate::api::request_dto::RawDocument;

/// Offline copy of everything the external collaborators would return,
/// keyed the way the services are queried.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotDto {
    /// Request name -> full workflow document.
    pub workflows: HashMap<String, RawDocument>,
    /// Request name -> workload spec carrying the splitting parameters.
    pub splitting_specs: HashMap<String, RawDocument>,
    pub campaigns: HashMap<String, CampaignConfigDto>,
    pub datasets: HashMap<String, DatasetDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetDto {
    pub blocks: Vec<BlockDto>,
    pub num_events: Option<u64>,
    pub num_lumis: Option<u64>,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockDto {
    pub name: String,
    pub size_bytes: u64,
    /// Storage nodes holding a replica of the block.
    pub nodes: Vec<String>,
}
