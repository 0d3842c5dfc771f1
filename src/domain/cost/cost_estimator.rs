use std::collections::HashMap;

use crate::api::request_dto::{FieldAccess, RawDocument};
use crate::domain::catalog::dataset_info::EventsLumis;
use crate::domain::cost::replica_estimator::CopiesPolicy;
use crate::domain::request::request_type::RequestType;
use crate::domain::request::workflow_io::WorkflowIo;
use crate::domain::task::task_walker::chain_members;
use crate::domain::utils::id::DatasetName;

pub trait CostEstimator: Send + Sync {
    fn estimate_cpu_hours(&self, workflow: &RawDocument, events_lumis: &HashMap<DatasetName, EventsLumis>) -> f64;

    fn copies_for(&self, cpu_hours: f64) -> u32;
}

/// Cost from the per-event processing time the request declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimePerEventEstimator {
    copies: CopiesPolicy,
}

impl TimePerEventEstimator {
    pub fn new(copies: CopiesPolicy) -> Self {
        TimePerEventEstimator { copies }
    }

    /// Seconds per event over the whole chain. Chain tasks without their
    /// own value inherit the top-level one.
    fn time_per_event(request_type: &RequestType, workflow: &RawDocument) -> f64 {
        let top = workflow.f64_field("TimePerEvent").unwrap_or(0.0);
        match request_type.chain_base() {
            Some(base) => {
                let tasks = chain_members(workflow, base);
                if tasks.is_empty() {
                    top
                } else {
                    tasks.iter().map(|t| t.f64_field("TimePerEvent").unwrap_or(top)).sum()
                }
            }
            None => top,
        }
    }

    /// Events of the primary inputs when the catalog knows them, otherwise
    /// the number of events the request asks to produce.
    fn events(request_type: &RequestType, workflow: &RawDocument, events_lumis: &HashMap<DatasetName, EventsLumis>) -> u64 {
        let io = WorkflowIo::from_document(request_type, workflow);
        let from_catalog: u64 = io.primary.iter().filter_map(|d| events_lumis.get(d)).map(|e| e.num_events).sum();
        if from_catalog > 0 {
            return from_catalog;
        }
        workflow.u64_field("RequestNumEvents").unwrap_or(0)
    }
}

impl CostEstimator for TimePerEventEstimator {
    fn estimate_cpu_hours(&self, workflow: &RawDocument, events_lumis: &HashMap<DatasetName, EventsLumis>) -> f64 {
        let request_type = RequestType::from_field(workflow.str_field("RequestType"));
        let seconds = Self::time_per_event(&request_type, workflow) * Self::events(&request_type, workflow, events_lumis) as f64;
        seconds / 3600.0
    }

    fn copies_for(&self, cpu_hours: f64) -> u32 {
        self.copies.copies_for(cpu_hours)
    }
}
