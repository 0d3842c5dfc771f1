use serde::Serialize;

use crate::domain::request::request_type::RequestType;
use crate::domain::task::task_node::TaskNode;

/// How much smaller the jobs of child tasks are than those of their parents.
///
/// A large factor means one parent job's output feeds many small child
/// jobs, which is only sustainable at sites with a large pledge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlowupFactors {
    pub min_child_job_per_event: Option<f64>,
    pub root_job_per_event: Option<f64>,
    pub max_blow_up: f64,
}

impl BlowupFactors {
    /// Factors of a workflow that is not a task chain: no restriction.
    pub fn unrestricted() -> Self {
        BlowupFactors { min_child_job_per_event: Some(1.0), root_job_per_event: Some(1.0), max_blow_up: 1.0 }
    }

    pub fn compute(request_type: &RequestType, tasks: &[TaskNode]) -> Self {
        if *request_type != RequestType::TaskChain {
            return BlowupFactors::unrestricted();
        }

        let work: Vec<&TaskNode> = tasks.iter().filter(|t| t.task_type.is_work_task()).collect();

        let mut min_child_job_per_event: Option<f64> = None;
        let mut root_job_per_event: Option<f64> = None;
        let mut max_blow_up = 1.0_f64;

        for task in &work {
            let child_size = task.splitting.job_granularity().map(|s| s as f64);
            let ancestors: Vec<&&TaskNode> = work.iter().filter(|p| task.descends_from(p)).collect();

            // With several roots the last one in chain order is reported.
            if ancestors.is_empty() {
                root_job_per_event = child_size;
                continue;
            }

            if let Some(child) = child_size {
                min_child_job_per_event = Some(min_child_job_per_event.map_or(child, |m| m.min(child)));
            }

            // Nearest ancestor that declares a job size.
            let parent_size = ancestors
                .iter()
                .filter_map(|p| p.splitting.job_granularity().map(|s| (p.path_name.len(), s as f64)))
                .max_by_key(|(depth, _)| *depth)
                .map(|(_, size)| size);

            if let (Some(parent), Some(child)) = (parent_size, child_size) {
                if child > 0.0 {
                    max_blow_up = max_blow_up.max(parent / child);
                }
            }
        }

        BlowupFactors { min_child_job_per_event, root_job_per_event, max_blow_up }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::splitting::{Splitting, SplittingAlgorithm};
    use crate::domain::task::task_node::TaskType;

    fn node(path: &str, task_type: TaskType, events_per_job: Option<u64>) -> TaskNode {
        let mut splitting = Splitting::new(SplittingAlgorithm::EventBased);
        splitting.events_per_job = events_per_job;
        TaskNode {
            index: 1,
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path_name: path.to_string(),
            task_type,
            input_dataset: None,
            pileup_datasets: Vec::new(),
            multicore: 1,
            splitting,
        }
    }

    #[test]
    fn parent_over_child_granularity() {
        let tasks = vec![
            node("/wf/Task1", TaskType::Production, Some(1000)),
            node("/wf/Task1_1", TaskType::Processing, Some(10)),
        ];

        let factors = BlowupFactors::compute(&RequestType::TaskChain, &tasks);

        assert_eq!(factors.max_blow_up, 100.0);
        assert_eq!(factors.root_job_per_event, Some(1000.0));
        assert_eq!(factors.min_child_job_per_event, Some(10.0));
    }

    #[test]
    fn several_children_report_smallest_child() {
        let tasks = vec![
            node("/wf/A", TaskType::Production, Some(1000)),
            node("/wf/A/B", TaskType::Processing, Some(200)),
            node("/wf/A/C", TaskType::Processing, Some(50)),
            node("/wf/A/B/D", TaskType::Skim, Some(100)),
            node("/wf/A/Merge", TaskType::Merge, Some(1)),
        ];

        let factors = BlowupFactors::compute(&RequestType::TaskChain, &tasks);

        assert_eq!(factors.min_child_job_per_event, Some(50.0));
        // A/C against A dominates; A/B/D is compared with its nearest ancestor A/B.
        assert_eq!(factors.max_blow_up, 20.0);
    }

    #[test]
    fn last_root_sets_root_granularity() {
        let tasks = vec![
            node("/wf/GenA", TaskType::Production, Some(500)),
            node("/wf/GenA/Reco", TaskType::Processing, Some(100)),
            node("/wf/GenB", TaskType::Production, Some(2000)),
        ];

        let factors = BlowupFactors::compute(&RequestType::TaskChain, &tasks);

        assert_eq!(factors.root_job_per_event, Some(2000.0));
        assert_eq!(factors.max_blow_up, 5.0);
    }

    #[test]
    fn growing_jobs_never_report_below_one() {
        let tasks = vec![node("/wf/A", TaskType::Production, Some(10)), node("/wf/A/B", TaskType::Processing, Some(100))];

        let factors = BlowupFactors::compute(&RequestType::TaskChain, &tasks);

        assert_eq!(factors.max_blow_up, 1.0);
    }

    #[test]
    fn non_task_chains_are_unrestricted() {
        let tasks = vec![node("/wf/A", TaskType::Production, Some(1000)), node("/wf/A/B", TaskType::Processing, Some(1))];

        assert_eq!(BlowupFactors::compute(&RequestType::StepChain, &tasks), BlowupFactors::unrestricted());
        assert_eq!(BlowupFactors::compute(&RequestType::ReReco, &tasks), BlowupFactors::unrestricted());
    }
}
