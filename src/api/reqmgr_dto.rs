use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope of every request manager answer.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReqMgrResponseDto<T> {
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

/// Splitting of one task as returned by `data/splitting/<request>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplittingEntryDto {
    /// Full task path, e.g. `/request/Task1/Task2`.
    #[serde(rename = "taskName")]
    pub task_name: String,
    #[serde(rename = "splitAlgo", default)]
    pub split_algo: String,
    /// `Production`, `Processing`, `Merge`, ...
    #[serde(rename = "taskType", default)]
    pub task_type: Option<String>,
    #[serde(rename = "splitParams", default)]
    pub split_params: Map<String, Value>,
}

/// Some deployments wrap the per-task list in one more array.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SplittingResultDto {
    List(Vec<SplittingEntryDto>),
    Entry(SplittingEntryDto),
}
