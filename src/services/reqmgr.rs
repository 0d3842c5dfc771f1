use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::api::campaign_dto::CampaignConfigDto;
use crate::api::reqmgr_dto::{ReqMgrResponseDto, SplittingEntryDto, SplittingResultDto};
use crate::api::request_dto::RawDocument;
use crate::domain::catalog::catalog_trait::{CampaignStore, WorkflowSpecService};
use crate::domain::site::campaign_policy::CampaignPolicy;
use crate::domain::utils::id::{CampaignName, RequestName};
use crate::error::{Error, Result};
use crate::services::http::{build_client, get_json, trim_base};

#[derive(Debug, Clone, Copy)]
pub enum ReqMgrEndpoint {
    Request,
    Splitting,
    CampaignConfig,
}

impl ReqMgrEndpoint {
    pub fn path(&self) -> &str {
        match self {
            Self::Request => "data/request",
            Self::Splitting => "data/splitting",
            Self::CampaignConfig => "data/campaignconfig",
        }
    }
}

/// Request manager REST client: workflow documents, workload splitting and
/// campaign configuration.
#[derive(Debug, Clone)]
pub struct ReqMgrClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqMgrClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(ReqMgrClient { client: build_client(timeout)?, base_url: trim_base(base_url) })
    }

    fn url(&self, endpoint: ReqMgrEndpoint, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, endpoint.path(), name)
    }
}

#[async_trait]
impl WorkflowSpecService for ReqMgrClient {
    async fn fetch_workflow(&self, name: &RequestName) -> Result<RawDocument> {
        let url = self.url(ReqMgrEndpoint::Request, name.as_str());
        let response: ReqMgrResponseDto<Map<String, Value>> = get_json(&self.client, &url, &[], "workflow spec", name.as_str()).await?;
        workflow_from_response(name, response)
    }

    async fn fetch_splitting_spec(&self, name: &RequestName) -> Result<RawDocument> {
        let url = self.url(ReqMgrEndpoint::Splitting, name.as_str());
        let response: ReqMgrResponseDto<SplittingResultDto> = get_json(&self.client, &url, &[], "splitting spec", name.as_str()).await?;
        Ok(splitting_from_response(response))
    }
}

#[async_trait]
impl CampaignStore for ReqMgrClient {
    async fn campaign_config(&self, name: &CampaignName) -> Result<Option<CampaignPolicy>> {
        let url = self.url(ReqMgrEndpoint::CampaignConfig, name.as_str());
        let response: ReqMgrResponseDto<CampaignConfigDto> = get_json(&self.client, &url, &[], "campaign config", name.as_str()).await?;
        Ok(campaign_from_response(name, response))
    }
}

/// `{"result": [{"<request>": {...}}]}`: the document keyed by the request
/// name, or the first result when the name is not a key.
pub fn workflow_from_response(name: &RequestName, response: ReqMgrResponseDto<Map<String, Value>>) -> Result<RawDocument> {
    let missing = || Error::FetchFailed { kind: "workflow spec", key: name.to_string(), reason: "empty result".to_string() };
    let mut first = response.result.into_iter().next().ok_or_else(missing)?;

    match first.remove(name.as_str()) {
        Some(Value::Object(document)) => Ok(RawDocument::new(document)),
        Some(_) => Err(Error::FetchFailed { kind: "workflow spec", key: name.to_string(), reason: "document is not an object".to_string() }),
        None if first.is_empty() => Err(missing()),
        None => Ok(RawDocument::new(first)),
    }
}

/// Task path -> splitting parameters, with the algorithm stored under
/// `algorithm` and the task type under `taskType`.
pub fn splitting_from_response(response: ReqMgrResponseDto<SplittingResultDto>) -> RawDocument {
    let entries = response.result.into_iter().flat_map(|r| match r {
        SplittingResultDto::Entry(entry) => vec![entry],
        SplittingResultDto::List(entries) => entries,
    });

    let mut spec = Map::new();
    for SplittingEntryDto { task_name, split_algo, task_type, mut split_params } in entries {
        split_params.insert("algorithm".to_string(), Value::String(split_algo));
        if let Some(task_type) = task_type.filter(|t| !t.is_empty()) {
            split_params.insert("taskType".to_string(), Value::String(task_type));
        }
        spec.insert(task_name, Value::Object(split_params));
    }
    RawDocument::new(spec)
}

pub fn campaign_from_response(name: &CampaignName, response: ReqMgrResponseDto<CampaignConfigDto>) -> Option<CampaignPolicy> {
    let record = response.result.into_iter().next()?.into_record()?;
    Some(CampaignPolicy::from_dto(name, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_workflow_keyed_by_name() {
        let response = serde_json::from_value(json!({"result": [{"wf": {"RequestType": "TaskChain", "Memory": 2000}}]})).unwrap();

        let doc = workflow_from_response(&RequestName::new("wf"), response).unwrap();

        assert_eq!(doc.get("RequestType"), Some(&json!("TaskChain")));
    }

    #[test]
    fn empty_workflow_result_is_a_fetch_failure() {
        let response = serde_json::from_value(json!({"result": []})).unwrap();

        let err = workflow_from_response(&RequestName::new("wf"), response).unwrap_err();

        assert!(matches!(err, Error::FetchFailed { .. }));
    }

    #[test]
    fn splitting_entries_are_keyed_by_task_path() {
        let response = serde_json::from_value(json!({"result": [[
            {"taskName": "/wf/GenSim", "taskType": "Production", "splitAlgo": "EventBased", "splitParams": {"events_per_job": 500}},
            {"taskName": "/wf/GenSim/GenSimMergeRAWSIMoutput/Digi", "splitAlgo": "EventAwareLumiBased",
             "splitParams": {"events_per_job": 50}},
        ]]}))
        .unwrap();

        let spec = splitting_from_response(response);

        assert_eq!(spec.len(), 2);
        assert_eq!(spec.get("/wf/GenSim"), Some(&json!({"events_per_job": 500, "algorithm": "EventBased", "taskType": "Production"})));
        assert_eq!(
            spec.get("/wf/GenSim/GenSimMergeRAWSIMoutput/Digi"),
            Some(&json!({"events_per_job": 50, "algorithm": "EventAwareLumiBased"}))
        );
    }

    #[test]
    fn campaign_config_may_be_absent() {
        let empty = serde_json::from_value(json!({"result": []})).unwrap();
        assert!(campaign_from_response(&CampaignName::new("C"), empty).is_none());

        let listed = serde_json::from_value(json!({"result": [[{"SiteBlacklist": ["T2_X"]}]]})).unwrap();
        let policy = campaign_from_response(&CampaignName::new("C"), listed).unwrap();
        assert_eq!(policy.campaign_name.as_str(), "C");
        assert!(policy.site_black_list.contains("T2_X"));
    }
}
