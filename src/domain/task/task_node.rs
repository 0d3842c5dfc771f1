use serde::Serialize;

use crate::domain::task::splitting::Splitting;
use crate::domain::utils::id::DatasetName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TaskType {
    Production,
    Processing,
    Skim,
    Merge,
    Harvesting,
    Cleanup,
    LogCollect,
    Other(String),
}

impl From<&str> for TaskType {
    fn from(s: &str) -> Self {
        match s {
            "Production" => TaskType::Production,
            "Processing" => TaskType::Processing,
            "Skim" => TaskType::Skim,
            "Merge" => TaskType::Merge,
            "Harvesting" => TaskType::Harvesting,
            "Cleanup" => TaskType::Cleanup,
            "LogCollect" => TaskType::LogCollect,
            other => TaskType::Other(other.to_string()),
        }
    }
}

impl TaskType {
    /// Tasks that run payload jobs, as opposed to bookkeeping tasks.
    pub fn is_work_task(&self) -> bool {
        matches!(self, TaskType::Production | TaskType::Processing | TaskType::Skim)
    }
}

/// One task of a request, in chain order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    /// 1-based position in the chain.
    pub index: usize,
    pub name: String,
    /// `/<request>/<ancestors...>/<task>`; a task's ancestors are the tasks
    /// whose path is a prefix of its own.
    pub path_name: String,
    pub task_type: TaskType,
    pub input_dataset: Option<DatasetName>,
    pub pileup_datasets: Vec<DatasetName>,
    pub multicore: u32,
    pub splitting: Splitting,
}

impl TaskNode {
    /// `other` is a strict path prefix of this node.
    pub fn descends_from(&self, other: &TaskNode) -> bool {
        self.path_name != other.path_name && self.path_name.starts_with(&other.path_name)
    }
}
