use serde_json::{Map, Value};

use crate::api::request_dto::{FieldAccess, RawDocument};
use crate::domain::request::request_type::RequestType;
use crate::domain::task::splitting::Splitting;
use crate::domain::task::task_node::{TaskNode, TaskType};
use crate::domain::utils::id::{DatasetName, RequestName};

/// Chained task objects `<base>1`, `<base>2`, ... in order. The chain ends
/// at the first index without an object, so a gap hides later tasks.
pub fn chain_members<'a>(doc: &'a Map<String, Value>, base: &str) -> Vec<&'a Map<String, Value>> {
    let mut members = Vec::new();
    let mut index = 1;
    while let Some(task) = doc.object_field(&format!("{}{}", base, index)) {
        members.push(task);
        index += 1;
    }
    members
}

/// Ordered task list of a request.
///
/// Non-chain requests have a single implicit task described by the
/// top-level fields.
pub fn walk(request: &RequestName, request_type: &RequestType, doc: &RawDocument) -> Vec<TaskNode> {
    let Some(base) = request_type.chain_base() else {
        let name = doc.str_field("TaskName").unwrap_or(request.as_str()).to_string();
        let path_name = doc.str_field("PathName").map(str::to_string).unwrap_or_else(|| format!("/{}/{}", request, name));
        return vec![build_node(1, name, path_name, doc, false)];
    };

    let name_key = format!("{}Name", base);
    let input_key = format!("Input{}", base);
    let mut nodes: Vec<TaskNode> = Vec::new();

    for (position, task) in chain_members(doc, base).into_iter().enumerate() {
        let index = position + 1;
        let name = task.str_field(&name_key).map(str::to_string).unwrap_or_else(|| format!("{}{}", base, index));
        let parent = task.str_field(&input_key);

        let path_name = match task.str_field("PathName") {
            Some(path) => path.to_string(),
            None => match parent.and_then(|p| nodes.iter().find(|n| n.name == p)) {
                Some(parent_node) => format!("{}/{}", parent_node.path_name, name),
                None => format!("/{}/{}", request, name),
            },
        };

        nodes.push(build_node(index, name, path_name, task, parent.is_some()));
    }

    nodes
}

/// Task list described by a workload spec.
///
/// The spec maps full task paths, merge tasks included, to splitting
/// parameters with `algorithm` and an optional `taskType`. Each entry is
/// matched to a walked task by path, else by its last path segment; the
/// matched task supplies inputs and cores, the entry supplies path, type
/// and splitting. Unmatched entries need a `taskType` to be kept. When no
/// entry is usable the walked tasks are returned unchanged.
pub fn apply_splitting_spec(walked: Vec<TaskNode>, spec: &RawDocument) -> Vec<TaskNode> {
    let unmatched_index = walked.len() + 1;
    let mut nodes: Vec<TaskNode> = Vec::with_capacity(spec.len());

    for (key, value) in spec.iter() {
        let Some(params) = value.as_object() else {
            continue;
        };
        let name = key.rsplit('/').next().unwrap_or(key.as_str());
        let matched = walked.iter().find(|n| n.path_name == *key).or_else(|| walked.iter().find(|n| n.name == name));
        let task_type = params.str_field("taskType").filter(|t| !t.is_empty()).map(TaskType::from);
        let splitting = Splitting::from_params(params.str_field("algorithm").unwrap_or_default(), params);

        let mut node = match (matched, task_type) {
            (Some(task), task_type) => {
                let mut node = task.clone();
                if let Some(task_type) = task_type {
                    node.task_type = task_type;
                }
                node
            }
            (None, Some(task_type)) => TaskNode {
                index: unmatched_index,
                name: name.to_string(),
                path_name: key.clone(),
                task_type,
                input_dataset: None,
                pileup_datasets: Vec::new(),
                multicore: 1,
                splitting: splitting.clone(),
            },
            (None, None) => continue,
        };
        // Bare task names keep the walked path.
        if key.starts_with('/') {
            node.path_name = key.clone();
        }
        node.splitting = splitting;
        nodes.push(node);
    }

    if nodes.is_empty() {
        return walked;
    }
    nodes.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path_name.cmp(&b.path_name)));
    nodes
}

fn build_node(index: usize, name: String, path_name: String, task: &Map<String, Value>, has_input_task: bool) -> TaskNode {
    let input_dataset = task.string_list("InputDataset").into_iter().next().map(DatasetName::new);

    let task_type = match task.str_field("TaskType") {
        Some(t) => TaskType::from(t),
        None if input_dataset.is_some() || has_input_task => TaskType::Processing,
        None => TaskType::Production,
    };

    let mut pileup_datasets: Vec<DatasetName> = task.string_list("MCPileup").into_iter().map(DatasetName::new).collect();
    pileup_datasets.extend(task.string_list("DataPileup").into_iter().map(DatasetName::new));

    TaskNode {
        index,
        name,
        path_name,
        task_type,
        input_dataset,
        pileup_datasets,
        multicore: task.u64_field("Multicore").unwrap_or(1).clamp(1, u32::MAX as u64) as u32,
        splitting: Splitting::from_task(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::blowup::BlowupFactors;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        RawDocument::try_from(value).unwrap()
    }

    #[test]
    fn walks_task_chain_until_first_gap() {
        let d = doc(json!({
            "RequestType": "TaskChain",
            "Task1": {"TaskName": "GenSim", "Splitting": {"algorithm": "EventBased", "events_per_job": 1000}},
            "Task2": {"TaskName": "Digi", "InputTask": "GenSim", "Multicore": 4,
                      "Splitting": {"algorithm": "EventAwareLumiBased", "events_per_job": 250}},
            "Task3": {"TaskName": "Reco", "InputTask": "Digi", "TaskType": "Skim"},
            "Task5": {"TaskName": "Orphan"},
        }));

        let nodes = walk(&RequestName::new("wf"), &RequestType::TaskChain, &d);

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].path_name, "/wf/GenSim");
        assert_eq!(nodes[0].task_type, TaskType::Production);
        assert_eq!(nodes[1].path_name, "/wf/GenSim/Digi");
        assert_eq!(nodes[1].task_type, TaskType::Processing);
        assert_eq!(nodes[1].multicore, 4);
        assert_eq!(nodes[1].splitting.avg_events_per_job, Some(250));
        assert_eq!(nodes[2].path_name, "/wf/GenSim/Digi/Reco");
        assert_eq!(nodes[2].task_type, TaskType::Skim);
        assert!(nodes[2].descends_from(&nodes[0]));
        assert!(!nodes[0].descends_from(&nodes[0]));
    }

    #[test]
    fn step_chain_uses_step_keys() {
        let d = doc(json!({
            "Step1": {"StepName": "GEN", "InputDataset": "/A/B/C"},
            "Step2": {"StepName": "DIGI", "InputStep": "GEN"},
        }));

        let nodes = walk(&RequestName::new("wf"), &RequestType::StepChain, &d);

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["GEN", "DIGI"]);
        assert_eq!(nodes[0].input_dataset, Some(DatasetName::new("/A/B/C")));
        assert_eq!(nodes[1].path_name, "/wf/GEN/DIGI");
    }

    #[test]
    fn workload_spec_overrides_splitting_by_path_or_name() {
        let d = doc(json!({
            "Task1": {"TaskName": "GenSim", "Splitting": {"algorithm": "EventBased", "events_per_job": 1000}},
            "Task2": {"TaskName": "Digi", "InputTask": "GenSim"},
        }));
        let spec = doc(json!({
            "/wf/GenSim": {"algorithm": "EventBased", "events_per_job": 2000},
            "Digi": {"algorithm": "EventAwareLumiBased", "events_per_job": 40},
        }));
        let walked = walk(&RequestName::new("wf"), &RequestType::TaskChain, &d);

        let nodes = apply_splitting_spec(walked, &spec);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].splitting.events_per_job, Some(2000));
        assert_eq!(nodes[1].path_name, "/wf/GenSim/Digi");
        assert_eq!(nodes[1].splitting.avg_events_per_job, Some(40));
    }

    #[test]
    fn workload_spec_paths_through_merge_tasks() {
        let d = doc(json!({
            "Task1": {"TaskName": "GenSim", "Splitting": {"algorithm": "EventBased", "events_per_job": 50}},
            "Task2": {"TaskName": "Digi", "InputTask": "GenSim", "Multicore": 4},
        }));
        let spec = doc(json!({
            "/wf/GenSim": {"algorithm": "EventBased", "events_per_job": 1000, "taskType": "Production"},
            "/wf/GenSim/GenSimMergeRAWSIMoutput": {"algorithm": "ParentlessMergeBySize", "taskType": "Merge"},
            "/wf/GenSim/GenSimMergeRAWSIMoutput/Digi": {"algorithm": "EventAwareLumiBased", "events_per_job": 10,
                                                        "taskType": "Processing"},
            "/wf/GenSim/LogCollect": {"algorithm": "MinFileBased"},
        }));
        let walked = walk(&RequestName::new("wf"), &RequestType::TaskChain, &d);

        let nodes = apply_splitting_spec(walked, &spec);

        let paths: Vec<&str> = nodes.iter().map(|n| n.path_name.as_str()).collect();
        assert_eq!(paths, vec!["/wf/GenSim", "/wf/GenSim/GenSimMergeRAWSIMoutput/Digi", "/wf/GenSim/GenSimMergeRAWSIMoutput"]);
        assert_eq!(nodes[1].multicore, 4);
        assert_eq!(nodes[2].task_type, TaskType::Merge);
        assert!(nodes[1].descends_from(&nodes[0]));

        let factors = BlowupFactors::compute(&RequestType::TaskChain, &nodes);
        assert_eq!(factors.max_blow_up, 100.0);
        assert_eq!(factors.root_job_per_event, Some(1000.0));
    }

    #[test]
    fn empty_workload_spec_keeps_walked_tasks() {
        let d = doc(json!({"Task1": {"TaskName": "GenSim", "Splitting": {"algorithm": "EventBased", "events_per_job": 50}}}));
        let walked = walk(&RequestName::new("wf"), &RequestType::TaskChain, &d);

        let nodes = apply_splitting_spec(walked.clone(), &RawDocument::default());

        assert_eq!(nodes, walked);
    }

    #[test]
    fn non_chain_request_is_one_implicit_task() {
        let d = doc(json!({"RequestType": "ReReco", "InputDataset": "/A/B/RAW", "SplittingAlgo": "LumiBased", "LumisPerJob": 8}));

        let nodes = walk(&RequestName::new("wf"), &RequestType::ReReco, &d);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path_name, "/wf/wf");
        assert_eq!(nodes[0].task_type, TaskType::Processing);
        assert_eq!(nodes[0].splitting.lumis_per_job, Some(8));
        assert_eq!(nodes[0].splitting.halt_job_on_file_boundaries, Some(true));
    }
}
