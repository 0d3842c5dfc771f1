use serde::{Deserialize, Serialize};

/// Row of `blocks?dataset=<name>&detail=true`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbsBlockDto {
    pub block_name: String,
    #[serde(default)]
    pub block_size: u64,
}

/// Row of `filesummaries?dataset=<name>`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DbsFileSummaryDto {
    #[serde(default)]
    pub num_event: Option<u64>,
    #[serde(default)]
    pub num_lumi: Option<u64>,
    #[serde(default)]
    pub num_file: Option<u64>,
}

/// Row of `datasetparents?dataset=<name>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbsDatasetParentDto {
    pub parent_dataset: String,
}
