use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::utils::id::{BlockId, DatasetName, RequestName, SiteName};

/// Where a workflow may run and how many replicas its input data needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementPlan {
    pub workflow_name: RequestName,
    /// Primary datasets followed by secondary ones.
    pub datasets: Vec<DatasetName>,
    pub blocks: Vec<BlockId>,
    pub num_pileups: usize,
    pub size_bytes: u64,
    pub num_events: u64,
    pub num_lumis: u64,
    pub estimated_cpu_hours: f64,
    pub required_copies: u32,
    /// Storage nodes already holding some block of the input.
    pub current_nodes: BTreeSet<SiteName>,
    /// Empty when no site can currently run the workflow.
    pub allowed_sites: BTreeSet<SiteName>,
    pub parent_datasets: Vec<DatasetName>,
    pub is_lhe_input: bool,
    pub primary_datasets: Vec<DatasetName>,
    pub secondary_datasets: Vec<DatasetName>,
}

/// Totals over every planned workflow of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub workflows: usize,
    pub datasets: usize,
    pub blocks: usize,
    pub events: u64,
    pub size_bytes: u64,
    pub cpu_hours: f64,
}

impl BatchTotals {
    pub fn add(&mut self, plan: &PlacementPlan) {
        self.workflows += 1;
        self.blocks += plan.blocks.len();
        self.events += plan.num_events;
        self.size_bytes += plan.size_bytes;
        self.cpu_hours += plan.estimated_cpu_hours;
    }
}
