use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::config_dto::{PickerKind, PlannerConfig};
use crate::api::request_dto::{FieldAccess, RawDocument};
use crate::domain::catalog::catalog_joiner::{CatalogJoiner, CatalogSnapshot};
use crate::domain::catalog::catalog_trait::{CampaignStore, DatasetCatalog, LocationService, WorkflowSpecService};
use crate::domain::catalog::dataset_info::tera_bytes;
use crate::domain::catalog::fan_out::{FanOutPolicy, fan_out};
use crate::domain::cost::cost_estimator::{CostEstimator, TimePerEventEstimator};
use crate::domain::cost::replica_estimator::CopiesPolicy;
use crate::domain::planner::placement_plan::PlacementPlan;
use crate::domain::planner::planning_report::{PlanningReport, PlanningWarning};
use crate::domain::request::request_record::RequestRecord;
use crate::domain::request::request_type::RequestType;
use crate::domain::request::workflow_io::{self, WorkflowIo};
use crate::domain::site::campaign_policy::CampaignPolicy;
use crate::domain::site::ce_picker::{CePicker, LargestPledgePicker, WeightedRandomPicker};
use crate::domain::site::eligibility::{EligibilityConfig, EligibilityInput, IoClass, SiteEligibilityEngine};
use crate::domain::site::site_info::SiteInfo;
use crate::domain::task::blowup::BlowupFactors;
use crate::domain::task::task_walker::{apply_splitting_spec, walk};
use crate::domain::utils::id::{CampaignName, DatasetName, RequestName, SiteName};
use crate::domain::utils::statistics::{ANALYTICS_TARGET, StatParameter, StatisticEvent, StatsCollector};
use crate::error::{Error, Result};

/// External collaborators of a planning run.
#[derive(Clone)]
pub struct PlannerServices {
    pub workflows: Arc<dyn WorkflowSpecService>,
    pub catalog: Arc<dyn DatasetCatalog>,
    pub locations: Arc<dyn LocationService>,
    pub campaigns: Arc<dyn CampaignStore>,
}

struct PendingRequest {
    record: RequestRecord,
    campaigns: Vec<CampaignName>,
}

/// A request whose workflow document has been fetched.
struct ResolvedWorkflow {
    record: RequestRecord,
    campaigns: Vec<CampaignName>,
    workflow: RawDocument,
    /// `None` when the workload spec could not be fetched; the splitting
    /// found in the workflow document is used instead.
    splitting_spec: Option<RawDocument>,
    request_type: RequestType,
    io: WorkflowIo,
}

/// Drives one planning run over a batch of requests.
///
/// All external lookups happen in bounded concurrent rounds, one per data
/// kind. The per-workflow planning afterwards only reads the joined maps.
pub struct WorkflowAggregator {
    services: PlannerServices,
    joiner: CatalogJoiner,
    engine: SiteEligibilityEngine,
    cost: Arc<dyn CostEstimator>,
    policy: FanOutPolicy,
    stats: Option<Arc<StatsCollector>>,
}

impl WorkflowAggregator {
    /// Aggregator with the configured single site picker and the
    /// time-per-event cost estimator.
    pub fn new(services: PlannerServices, sites: Arc<SiteInfo>, config: &PlannerConfig) -> Self {
        let picker: Arc<dyn CePicker> = match config.picker {
            PickerKind::LargestPledge => Arc::new(LargestPledgePicker),
            PickerKind::WeightedRandom => Arc::new(WeightedRandomPicker),
        };
        let engine = SiteEligibilityEngine::new(EligibilityConfig::new(&config.blow_up_limits, config.pick_one), sites, picker);
        let cost = Arc::new(TimePerEventEstimator::new(CopiesPolicy::from(&config.copies)));
        Self::with_parts(services, engine, cost, FanOutPolicy::from(&config.fan_out))
    }

    pub fn with_parts(services: PlannerServices, engine: SiteEligibilityEngine, cost: Arc<dyn CostEstimator>, policy: FanOutPolicy) -> Self {
        let joiner = CatalogJoiner::new(services.catalog.clone(), services.locations.clone(), policy);
        WorkflowAggregator { services, joiner, engine, cost, policy, stats: None }
    }

    pub fn with_stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Plans every request of the batch. Requests that cannot be planned are
    /// left out of `plans` and explained in `warnings`; this never fails as
    /// a whole.
    pub async fn plan(&self, requests: Vec<RawDocument>) -> PlanningReport {
        let started = Instant::now();
        let mut report = PlanningReport::default();
        let received = requests.len();

        let pending = normalize_all(requests, &mut report.warnings);
        let mut policies = HashMap::new();
        let named: BTreeSet<CampaignName> = pending.iter().flat_map(|p| p.campaigns.iter().cloned()).collect();
        self.resolve_campaigns(named.clone(), &mut policies, &mut report.warnings).await;
        let pending = skip_unconfigured(pending, &policies, &mut report.warnings);

        let workflows = self.fetch_workflows(pending, &mut report.warnings).await;
        // Campaigns only the fetched workflow documents name.
        let late: BTreeSet<CampaignName> =
            workflows.iter().flat_map(|w| w.campaigns.iter()).filter(|c| !named.contains(*c)).cloned().collect();
        if !late.is_empty() {
            self.resolve_campaigns(late, &mut policies, &mut report.warnings).await;
        }
        let workflows = skip_unconfigured(workflows, &policies, &mut report.warnings);

        let datasets: BTreeSet<DatasetName> = workflows.iter().flat_map(|w| w.io.datasets()).collect();
        let parent_inputs: BTreeSet<DatasetName> =
            workflows.iter().filter(|w| w.io.include_parents).flat_map(|w| w.io.primary.iter().cloned()).collect();

        let (mut snapshot, (parents, parent_warnings)) =
            tokio::join!(self.joiner.join(&datasets), self.joiner.resolve_parents(&parent_inputs));
        report.warnings.append(&mut snapshot.warnings);
        report.warnings.extend(parent_warnings);

        for workflow in &workflows {
            let workflow_started = Instant::now();
            match self.build_plan(workflow, &policies, &snapshot, &parents) {
                Ok(plan) => {
                    self.record_workflow(workflow, &plan, workflow_started.elapsed());
                    report.totals.add(&plan);
                    report.plans.push(plan);
                }
                Err(e) => {
                    log::warn!("Skipping workflow {}: {}", workflow.record.name, e);
                    report.warnings.push(PlanningWarning::new(workflow.record.name.as_str(), e));
                }
            }
        }
        report.totals.datasets = datasets.len();

        self.record_batch(&report, received, started.elapsed());
        report
    }

    /// One round over the given campaigns. Campaigns without configuration
    /// stay absent from `policies`.
    async fn resolve_campaigns(
        &self,
        names: BTreeSet<CampaignName>,
        policies: &mut HashMap<CampaignName, CampaignPolicy>,
        warnings: &mut Vec<PlanningWarning>,
    ) {
        let store = &self.services.campaigns;

        let configs = fan_out("campaign config", names, &self.policy, |name: CampaignName| async move {
            store.campaign_config(&name).await
        })
        .await;

        for (name, e) in configs.failures {
            warnings.push(PlanningWarning::new(name.as_str(), e));
        }
        policies.extend(configs.values.into_iter().filter_map(|(name, policy)| policy.map(|p| (name, p))));
    }

    /// Workflow documents and workload specs, one round each, run together.
    async fn fetch_workflows(&self, pending: Vec<PendingRequest>, warnings: &mut Vec<PlanningWarning>) -> Vec<ResolvedWorkflow> {
        let names: Vec<RequestName> = pending.iter().map(|p| p.record.name.clone()).collect();
        let specs = &self.services.workflows;

        let (mut documents, mut splitting) = tokio::join!(
            fan_out("workflow spec", names.iter().cloned(), &self.policy, |name: RequestName| async move {
                specs.fetch_workflow(&name).await
            }),
            fan_out("splitting spec", names.iter().cloned(), &self.policy, |name: RequestName| async move {
                specs.fetch_splitting_spec(&name).await
            }),
        );

        for (name, e) in documents.failures {
            warnings.push(PlanningWarning::new(name.as_str(), e));
        }

        let mut resolved = Vec::with_capacity(pending.len());
        for PendingRequest { record, campaigns: requested } in pending {
            let Some(workflow) = documents.values.remove(&record.name) else {
                continue;
            };
            let request_type = match workflow.str_field("RequestType") {
                Some(t) => RequestType::from_field(Some(t)),
                None => record.request_type.clone(),
            };
            let mut campaigns = workflow_io::campaigns(&request_type, &workflow);
            if campaigns.is_empty() {
                campaigns = requested;
            }
            let mut io = WorkflowIo::from_document(&request_type, &workflow);
            io.add_references(&record.datasets);
            let splitting_spec = splitting.values.remove(&record.name);
            resolved.push(ResolvedWorkflow { record, campaigns, workflow, splitting_spec, request_type, io });
        }
        resolved
    }

    fn build_plan(
        &self,
        wf: &ResolvedWorkflow,
        policies: &HashMap<CampaignName, CampaignPolicy>,
        snapshot: &CatalogSnapshot,
        parents: &HashMap<DatasetName, Vec<DatasetName>>,
    ) -> Result<PlacementPlan> {
        let name = &wf.record.name;
        let datasets = wf.io.datasets();

        let mut infos = Vec::with_capacity(datasets.len());
        for dataset in &datasets {
            infos.push(snapshot.datasets.get(dataset).ok_or_else(|| Error::UnresolvableDataset(dataset.to_string()))?);
        }

        let memory_mb = workflow_io::memory_mb(&wf.workflow).ok_or_else(|| Error::InvalidRequest {
            request: name.to_string(),
            reason: "Memory is missing or not a number".to_string(),
        })?;

        let mut tasks = walk(name, &wf.request_type, &wf.workflow);
        if let Some(spec) = &wf.splitting_spec {
            tasks = apply_splitting_spec(tasks, spec);
        }
        let blow_up = BlowupFactors::compute(&wf.request_type, &tasks);

        let campaign_policies: Vec<CampaignPolicy> = wf.campaigns.iter().filter_map(|c| policies.get(c).cloned()).collect();
        let input = EligibilityInput {
            io_class: IoClass::of(&wf.io, workflow_io::heavy_read(&wf.workflow, &wf.campaigns)),
            blow_up,
            campaigns: &campaign_policies,
            memory_mb,
            multicore: workflow_io::multicore(&wf.request_type, &wf.workflow),
        };
        let allowed_sites = self.engine.allowed_sites(name.as_str(), &input);

        let estimated_cpu_hours = self.cost.estimate_cpu_hours(&wf.workflow, &snapshot.events_lumis);
        let required_copies = self.cost.copies_for(estimated_cpu_hours);

        let mut blocks = Vec::new();
        let mut current_nodes: BTreeSet<SiteName> = BTreeSet::new();
        let (mut size_bytes, mut num_events, mut num_lumis) = (0u64, 0u64, 0u64);
        for info in &infos {
            for block in &info.blocks {
                if let Some(nodes) = snapshot.block_nodes.get(block) {
                    current_nodes.extend(nodes.iter().cloned());
                }
                blocks.push(block.clone());
            }
            size_bytes += info.size_bytes;
            num_events += info.num_events;
            num_lumis += info.num_lumis;
        }

        let parent_datasets: Vec<DatasetName> = if wf.io.include_parents {
            let unique: BTreeSet<&DatasetName> = wf.io.primary.iter().filter_map(|p| parents.get(p)).flatten().collect();
            unique.into_iter().cloned().collect()
        } else {
            Vec::new()
        };

        log::debug!(
            "{}: {} datasets, {} blocks, {} bytes ({:.3} TB), {} nevts, {} nlumis, cput {:.1}, copies {}, nodes {:?}",
            name,
            datasets.len(),
            blocks.len(),
            size_bytes,
            tera_bytes(size_bytes),
            num_events,
            num_lumis,
            estimated_cpu_hours,
            required_copies,
            current_nodes
        );

        Ok(PlacementPlan {
            workflow_name: name.clone(),
            datasets,
            blocks,
            num_pileups: wf.io.secondary.len(),
            size_bytes,
            num_events,
            num_lumis,
            estimated_cpu_hours,
            required_copies,
            current_nodes,
            allowed_sites,
            parent_datasets,
            is_lhe_input: wf.io.lhe_input,
            primary_datasets: wf.io.primary.iter().cloned().collect(),
            secondary_datasets: wf.io.secondary.iter().cloned().collect(),
        })
    }

    fn record_workflow(&self, wf: &ResolvedWorkflow, plan: &PlacementPlan, elapsed: Duration) {
        let Some(stats) = &self.stats else {
            return;
        };

        let mut event = StatisticEvent::new();
        event
            .set(StatParameter::LogDescription, "WORKFLOW")
            .set(StatParameter::WorkflowName, plan.workflow_name.as_str())
            .set(StatParameter::RequestType, wf.request_type.to_string())
            .set(StatParameter::NumDatasets, plan.datasets.len())
            .set(StatParameter::NumBlocks, plan.blocks.len())
            .set(StatParameter::SizeBytes, plan.size_bytes)
            .set(StatParameter::NumEvents, plan.num_events)
            .set(StatParameter::NumLumis, plan.num_lumis)
            .set(StatParameter::CpuHours, plan.estimated_cpu_hours)
            .set(StatParameter::RequiredCopies, plan.required_copies)
            .set(StatParameter::NumAllowedSites, plan.allowed_sites.len())
            .set(StatParameter::NumCurrentNodes, plan.current_nodes.len())
            .set(StatParameter::ProcessingTime, elapsed.as_millis() as u64);
        stats.add_event(event);
    }

    fn record_batch(&self, report: &PlanningReport, received: usize, elapsed: Duration) {
        let totals = &report.totals;

        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Planning run finished",
            Requests = received,
            Workflows = totals.workflows,
            Datasets = totals.datasets,
            Blocks = totals.blocks,
            Events = totals.events,
            SizeBytes = totals.size_bytes,
            SizeTB = tera_bytes(totals.size_bytes),
            CpuHours = totals.cpu_hours,
            Warnings = report.warnings.len(),
            ProcessingTime = elapsed.as_millis() as u64,
        );

        if let Some(stats) = &self.stats {
            let mut event = StatisticEvent::new();
            event
                .set(StatParameter::LogDescription, "BATCH")
                .set(StatParameter::NumDatasets, totals.datasets)
                .set(StatParameter::NumBlocks, totals.blocks)
                .set(StatParameter::SizeBytes, totals.size_bytes)
                .set(StatParameter::NumEvents, totals.events)
                .set(StatParameter::CpuHours, totals.cpu_hours)
                .set(StatParameter::NumWarnings, report.warnings.len())
                .set(StatParameter::ProcessingTime, elapsed.as_millis() as u64);
            stats.add_event(event);
        }
    }
}

/// Requests and workflows carrying the campaigns their placement depends on.
trait CampaignBound {
    fn request_name(&self) -> &RequestName;
    fn campaigns(&self) -> &[CampaignName];
}

impl CampaignBound for PendingRequest {
    fn request_name(&self) -> &RequestName {
        &self.record.name
    }

    fn campaigns(&self) -> &[CampaignName] {
        &self.campaigns
    }
}

impl CampaignBound for ResolvedWorkflow {
    fn request_name(&self) -> &RequestName {
        &self.record.name
    }

    fn campaigns(&self) -> &[CampaignName] {
        &self.campaigns
    }
}

/// Drops every item naming a campaign without configuration.
fn skip_unconfigured<T: CampaignBound>(
    items: Vec<T>,
    policies: &HashMap<CampaignName, CampaignPolicy>,
    warnings: &mut Vec<PlanningWarning>,
) -> Vec<T> {
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        match item.campaigns().iter().find(|c| !policies.contains_key(*c)) {
            Some(missing) => {
                let name = item.request_name();
                log::warn!("No campaign configuration found for {}, skip request {}", missing, name);
                warnings.push(PlanningWarning::new(name.as_str(), Error::MissingCampaignConfig(missing.to_string())));
            }
            None => kept.push(item),
        }
    }
    kept
}

/// Normalizes every request, keeping input order. Requests without a usable
/// identity, and repeats of an already seen name, are skipped.
fn normalize_all(requests: Vec<RawDocument>, warnings: &mut Vec<PlanningWarning>) -> Vec<PendingRequest> {
    let mut seen: BTreeSet<RequestName> = BTreeSet::new();
    let mut pending = Vec::with_capacity(requests.len());

    for (position, raw) in requests.iter().enumerate() {
        let normalized = RequestRecord::normalize(raw).and_then(|record| Ok((record, RequestRecord::body(raw)?)));
        let (record, body) = match normalized {
            Ok(parts) => parts,
            Err(e) => {
                log::warn!("Skipping request #{}: {}", position, e);
                warnings.push(PlanningWarning::new(format!("request #{}", position), e));
                continue;
            }
        };

        if !seen.insert(record.name.clone()) {
            warnings.push(PlanningWarning::new(
                record.name.as_str(),
                Error::InvalidRequest { request: record.name.to_string(), reason: "duplicate request name in batch".to_string() },
            ));
            continue;
        }

        let campaigns = workflow_io::campaigns(&record.request_type, &body);
        pending.push(PendingRequest { record, campaigns });
    }

    log::info!("Normalized {} of {} requests", pending.len(), requests.len());
    pending
}
