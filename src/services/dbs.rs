use async_trait::async_trait;
use std::time::Duration;

use crate::api::dbs_dto::{DbsBlockDto, DbsDatasetParentDto, DbsFileSummaryDto};
use crate::domain::catalog::catalog_trait::DatasetCatalog;
use crate::domain::catalog::dataset_info::{DatasetBlocks, EventsLumis};
use crate::domain::utils::id::{BlockId, DatasetName};
use crate::error::{Error, Result};
use crate::services::http::{build_client, get_json, trim_base};

#[derive(Debug, Clone, Copy)]
pub enum DbsEndpoint {
    Blocks,
    FileSummaries,
    DatasetParents,
}

impl DbsEndpoint {
    pub fn path(&self) -> &str {
        match self {
            Self::Blocks => "blocks",
            Self::FileSummaries => "filesummaries",
            Self::DatasetParents => "datasetparents",
        }
    }
}

/// Dataset bookkeeping (DBS reader) client.
#[derive(Debug, Clone)]
pub struct DbsClient {
    client: reqwest::Client,
    base_url: String,
}

impl DbsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(DbsClient { client: build_client(timeout)?, base_url: trim_base(base_url) })
    }

    fn url(&self, endpoint: DbsEndpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl DatasetCatalog for DbsClient {
    async fn resolve_dataset(&self, name: &DatasetName) -> Result<DatasetBlocks> {
        let query = [("dataset", name.as_str()), ("detail", "true")];
        let rows: Vec<DbsBlockDto> = get_json(&self.client, &self.url(DbsEndpoint::Blocks), &query, "dataset blocks", name.as_str()).await?;
        dataset_blocks(name, rows)
    }

    async fn resolve_events_lumis(&self, name: &DatasetName) -> Result<EventsLumis> {
        let query = [("dataset", name.as_str())];
        let rows: Vec<DbsFileSummaryDto> =
            get_json(&self.client, &self.url(DbsEndpoint::FileSummaries), &query, "events and lumis", name.as_str()).await?;
        Ok(events_lumis(&rows))
    }

    async fn resolve_parents(&self, name: &DatasetName) -> Result<Vec<DatasetName>> {
        let query = [("dataset", name.as_str())];
        let rows: Vec<DbsDatasetParentDto> =
            get_json(&self.client, &self.url(DbsEndpoint::DatasetParents), &query, "dataset parents", name.as_str()).await?;
        Ok(rows.into_iter().map(|r| DatasetName::new(r.parent_dataset)).collect())
    }
}

/// An unknown dataset comes back as an empty block list.
pub fn dataset_blocks(name: &DatasetName, rows: Vec<DbsBlockDto>) -> Result<DatasetBlocks> {
    if rows.is_empty() {
        return Err(Error::UnresolvableDataset(name.to_string()));
    }

    let mut blocks = DatasetBlocks::default();
    for row in rows {
        blocks.size_bytes += row.block_size;
        blocks.blocks.insert(BlockId::new(row.block_name));
    }
    Ok(blocks)
}

pub fn events_lumis(rows: &[DbsFileSummaryDto]) -> EventsLumis {
    rows.iter().fold(EventsLumis::default(), |acc, row| EventsLumis {
        num_events: acc.num_events + row.num_event.unwrap_or(0),
        num_lumis: acc.num_lumis + row.num_lumi.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sums_block_sizes() {
        let rows: Vec<DbsBlockDto> = serde_json::from_value(json!([
            {"block_name": "/A/B/C#1", "block_size": 100, "open_for_writing": 0},
            {"block_name": "/A/B/C#2", "block_size": 250},
        ]))
        .unwrap();

        let blocks = dataset_blocks(&DatasetName::new("/A/B/C"), rows).unwrap();

        assert_eq!(blocks.size_bytes, 350);
        assert!(blocks.blocks.contains("/A/B/C#2"));
    }

    #[test]
    fn unknown_dataset_is_unresolvable() {
        let err = dataset_blocks(&DatasetName::new("/X/Y/Z"), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::UnresolvableDataset(name) if name == "/X/Y/Z"));
    }

    #[test]
    fn missing_summary_counts_as_zero() {
        let rows: Vec<DbsFileSummaryDto> = serde_json::from_value(json!([{"num_event": 1200, "num_lumi": null, "num_file": 3}])).unwrap();

        assert_eq!(events_lumis(&rows), EventsLumis { num_events: 1200, num_lumis: 0 });
        assert_eq!(events_lumis(&[]), EventsLumis::default());
    }
}
