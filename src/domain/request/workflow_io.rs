use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::api::request_dto::{FieldAccess, RawDocument, value_as_f64};
use crate::domain::request::request_record::DatasetRef;
use crate::domain::request::request_type::RequestType;
use crate::domain::task::task_walker::chain_members;
use crate::domain::utils::id::{CampaignName, DatasetName};

/// Input/output facts of a workflow, gathered over every task of a chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowIo {
    pub lhe_input: bool,
    pub primary: BTreeSet<DatasetName>,
    pub secondary: BTreeSet<DatasetName>,
    /// Set when some task asks for the parents of its input to be read too.
    pub include_parents: bool,
}

impl WorkflowIo {
    pub fn from_document(request_type: &RequestType, doc: &RawDocument) -> WorkflowIo {
        let mut io = WorkflowIo::default();
        match request_type.chain_base() {
            Some(base) => {
                for task in chain_members(doc, base) {
                    io.add_task(task);
                }
            }
            None => io.add_task(doc),
        }
        io
    }

    fn add_task(&mut self, task: &Map<String, Value>) {
        let primary = task.string_list("InputDataset");
        if !primary.is_empty() && (task.flag("IncludeParents") || task.flag("IncludeParent")) {
            self.include_parents = true;
        }
        self.primary.extend(primary.into_iter().map(DatasetName::new));
        self.secondary.extend(task.string_list("MCPileup").into_iter().map(DatasetName::new));
        self.secondary.extend(task.string_list("DataPileup").into_iter().map(DatasetName::new));
        if task.flag("LheInputFiles") {
            self.lhe_input = true;
        }
    }

    /// Adds inputs the request names but the workflow document leaves out.
    pub fn add_references(&mut self, references: &[DatasetRef]) {
        for reference in references {
            let target = if reference.kind.is_pileup() { &mut self.secondary } else { &mut self.primary };
            target.insert(reference.name.clone());
        }
    }

    /// Primary inputs first, then pileups, without duplicates.
    pub fn datasets(&self) -> Vec<DatasetName> {
        let mut all: Vec<DatasetName> = self.primary.iter().cloned().collect();
        all.extend(self.secondary.iter().filter(|d| !self.primary.contains(*d)).cloned());
        all
    }
}

pub fn is_relval(doc: &RawDocument) -> bool {
    doc.str_field("SubRequestType").is_some_and(|s| s.contains("RelVal"))
}

/// Campaigns whose policies apply to the workflow.
///
/// Chains (other than RelVal samples) carry one acquisition era per task;
/// the distinct eras are returned in chain order. Everything else uses the
/// top-level `Campaign`.
pub fn campaigns(request_type: &RequestType, doc: &RawDocument) -> Vec<CampaignName> {
    let mut campaigns: Vec<CampaignName> = Vec::new();
    if let Some(base) = request_type.chain_base() {
        if !is_relval(doc) {
            for task in chain_members(doc, base) {
                if let Some(era) = task.str_field("AcquisitionEra").filter(|e| !e.is_empty()) {
                    let era = CampaignName::new(era);
                    if !campaigns.contains(&era) {
                        campaigns.push(era);
                    }
                }
            }
        }
    }
    if campaigns.is_empty() {
        if let Some(campaign) = doc.str_field("Campaign").filter(|c| !c.is_empty()) {
            campaigns.push(CampaignName::new(campaign));
        }
    }
    campaigns
}

/// False as soon as "premix" shows up in a campaign or an output dataset.
pub fn heavy_read(doc: &RawDocument, campaigns: &[CampaignName]) -> bool {
    let premix = |s: &str| s.to_lowercase().contains("premix");
    if campaigns.iter().any(|c| premix(c.as_str())) {
        return false;
    }
    !doc.string_list("OutputDatasets").iter().any(|o| premix(o))
}

/// Largest core count requested by the workflow or any task of its chain.
pub fn multicore(request_type: &RequestType, doc: &RawDocument) -> u32 {
    let mut cores = doc.u64_field("Multicore").unwrap_or(1);
    if let Some(base) = request_type.chain_base() {
        for task in chain_members(doc, base) {
            cores = cores.max(task.u64_field("Multicore").unwrap_or(1));
        }
    }
    cores.clamp(1, u32::MAX as u64) as u32
}

/// Requested memory in MB. StepChains may give one value per step, in which
/// case the largest one is used.
pub fn memory_mb(doc: &RawDocument) -> Option<f64> {
    match doc.field("Memory")? {
        Value::Object(per_step) => per_step.values().filter_map(value_as_f64).reduce(f64::max),
        other => value_as_f64(other),
    }
}
