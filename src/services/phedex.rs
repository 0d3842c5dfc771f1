use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::api::phedex_dto::PhedexResponseDto;
use crate::domain::catalog::catalog_trait::LocationService;
use crate::domain::utils::id::{BlockId, DatasetName, SiteName};
use crate::error::Result;
use crate::services::http::{build_client, get_json, trim_base};

const BLOCK_REPLICAS: &str = "blockreplicas";

/// Data location client.
#[derive(Debug, Clone)]
pub struct PhedexClient {
    client: reqwest::Client,
    base_url: String,
}

impl PhedexClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(PhedexClient { client: build_client(timeout)?, base_url: trim_base(base_url) })
    }
}

#[async_trait]
impl LocationService for PhedexClient {
    async fn resolve_block_nodes(&self, dataset: &DatasetName) -> Result<HashMap<BlockId, BTreeSet<SiteName>>> {
        let url = format!("{}/{}", self.base_url, BLOCK_REPLICAS);
        let query = [("dataset", dataset.as_str())];
        let response: PhedexResponseDto = get_json(&self.client, &url, &query, "block locations", dataset.as_str()).await?;
        Ok(block_nodes(response))
    }
}

pub fn block_nodes(response: PhedexResponseDto) -> HashMap<BlockId, BTreeSet<SiteName>> {
    response
        .phedex
        .block
        .into_iter()
        .map(|block| (BlockId::new(block.name), block.replica.into_iter().map(|r| SiteName::new(r.node)).collect()))
        .collect()
}
