use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::catalog::catalog_trait::{DatasetCatalog, LocationService};
use crate::domain::catalog::dataset_info::{DatasetInfo, EventsLumis, tera_bytes};
use crate::domain::catalog::fan_out::{FanOutPolicy, fan_out};
use crate::domain::planner::planning_report::PlanningWarning;
use crate::domain::utils::id::{BlockId, DatasetName, SiteName};

/// Everything known about the datasets of one batch after the catalog
/// rounds. A dataset whose block lookup failed is absent from `datasets`.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub datasets: HashMap<DatasetName, DatasetInfo>,
    pub events_lumis: HashMap<DatasetName, EventsLumis>,
    pub block_nodes: HashMap<BlockId, BTreeSet<SiteName>>,
    pub warnings: Vec<PlanningWarning>,
}

impl CatalogSnapshot {
    pub fn total_size(&self) -> u64 {
        self.datasets.values().map(|d| d.size_bytes).sum()
    }
}

pub struct CatalogJoiner {
    catalog: Arc<dyn DatasetCatalog>,
    locations: Arc<dyn LocationService>,
    policy: FanOutPolicy,
}

impl CatalogJoiner {
    pub fn new(catalog: Arc<dyn DatasetCatalog>, locations: Arc<dyn LocationService>, policy: FanOutPolicy) -> Self {
        CatalogJoiner { catalog, locations, policy }
    }

    /// Resolves every dataset of the batch with one round per data kind;
    /// the three rounds run at the same time.
    pub async fn join(&self, datasets: &BTreeSet<DatasetName>) -> CatalogSnapshot {
        let catalog = &self.catalog;
        let locations = &self.locations;

        let (blocks, events, nodes) = tokio::join!(
            fan_out("dataset blocks", datasets.iter().cloned(), &self.policy, |name: DatasetName| async move {
                catalog.resolve_dataset(&name).await
            }),
            fan_out("events and lumis", datasets.iter().cloned(), &self.policy, |name: DatasetName| async move {
                catalog.resolve_events_lumis(&name).await
            }),
            fan_out("block locations", datasets.iter().cloned(), &self.policy, |name: DatasetName| async move {
                locations.resolve_block_nodes(&name).await
            }),
        );

        let mut snapshot = CatalogSnapshot::default();

        for (name, e) in blocks.failures.into_iter().chain(events.failures).chain(nodes.failures) {
            snapshot.warnings.push(PlanningWarning::new(name.as_str(), e));
        }

        for (name, dataset_blocks) in blocks.values {
            let counts = events.values.get(&name).copied().unwrap_or_default();
            snapshot.datasets.insert(name.clone(), DatasetInfo::new(name, dataset_blocks, counts));
        }
        snapshot.events_lumis = events.values;

        for (_, located) in nodes.values {
            for (block, sites) in located {
                snapshot.block_nodes.entry(block).or_default().extend(sites);
            }
        }

        log::info!(
            "Resolved {} of {} datasets ({:.3} TB), {} located blocks",
            snapshot.datasets.len(),
            datasets.len(),
            tera_bytes(snapshot.total_size()),
            snapshot.block_nodes.len()
        );
        snapshot
    }

    /// Parent datasets of the given inputs, in one round. Inputs whose
    /// lookup failed are missing from the map and reported as warnings.
    pub async fn resolve_parents(&self, datasets: &BTreeSet<DatasetName>) -> (HashMap<DatasetName, Vec<DatasetName>>, Vec<PlanningWarning>) {
        if datasets.is_empty() {
            return (HashMap::new(), Vec::new());
        }

        let catalog = &self.catalog;
        let parents = fan_out("dataset parents", datasets.iter().cloned(), &self.policy, |name: DatasetName| async move {
            catalog.resolve_parents(&name).await
        })
        .await;

        let warnings = parents.failures.into_iter().map(|(name, e)| PlanningWarning::new(name.as_str(), e)).collect();
        (parents.values, warnings)
    }
}
