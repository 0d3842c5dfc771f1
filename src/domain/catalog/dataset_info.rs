use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::utils::id::{BlockId, DatasetName};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetBlocks {
    pub blocks: BTreeSet<BlockId>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventsLumis {
    pub num_events: u64,
    pub num_lumis: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    pub name: DatasetName,
    pub blocks: BTreeSet<BlockId>,
    pub size_bytes: u64,
    pub num_events: u64,
    pub num_lumis: u64,
}

impl DatasetInfo {
    pub fn new(name: DatasetName, blocks: DatasetBlocks, events_lumis: EventsLumis) -> Self {
        DatasetInfo {
            name,
            blocks: blocks.blocks,
            size_bytes: blocks.size_bytes,
            num_events: events_lumis.num_events,
            num_lumis: events_lumis.num_lumis,
        }
    }
}

/// Bytes expressed in TB, for log lines.
pub fn tera_bytes(size: u64) -> f64 {
    size as f64 / 1e12
}
