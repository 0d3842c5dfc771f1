use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::config_dto::BlowUpLimitsDto;
use crate::domain::request::workflow_io::WorkflowIo;
use crate::domain::site::campaign_policy::CampaignPolicy;
use crate::domain::site::ce_picker::CePicker;
use crate::domain::site::site_info::SiteInfo;
use crate::domain::task::blowup::BlowupFactors;
use crate::domain::utils::id::SiteName;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityConfig {
    /// Blow-up factor above which only large sites are kept.
    pub max_blow_up: f64,
    /// CPU pledge a site must exceed to count as large.
    pub needed_cores: u64,
    /// Reduce the final site set to the one chosen by the picker.
    pub pick_one: bool,
}

impl EligibilityConfig {
    pub fn new(limits: &BlowUpLimitsDto, pick_one: bool) -> Self {
        EligibilityConfig { max_blow_up: limits.max_blow_up, needed_cores: limits.needed_cores, pick_one }
    }
}

/// Data access pattern of a workflow, which decides the initial site set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoClass {
    Lhe,
    Secondary { heavy_read: bool },
    Primary,
    NoInput,
}

impl IoClass {
    pub fn of(io: &WorkflowIo, heavy_read: bool) -> Self {
        if io.lhe_input {
            IoClass::Lhe
        } else if !io.secondary.is_empty() {
            IoClass::Secondary { heavy_read }
        } else if !io.primary.is_empty() {
            IoClass::Primary
        } else {
            IoClass::NoInput
        }
    }
}

/// Resolved facts about one workflow the filters run over.
#[derive(Debug, Clone)]
pub struct EligibilityInput<'a> {
    pub io_class: IoClass,
    pub blow_up: BlowupFactors,
    /// In the order the workflow names its campaigns.
    pub campaigns: &'a [CampaignPolicy],
    pub memory_mb: f64,
    pub multicore: u32,
}

pub struct SiteEligibilityEngine {
    config: EligibilityConfig,
    sites: Arc<SiteInfo>,
    picker: Arc<dyn CePicker>,
}

impl SiteEligibilityEngine {
    pub fn new(config: EligibilityConfig, sites: Arc<SiteInfo>, picker: Arc<dyn CePicker>) -> Self {
        SiteEligibilityEngine { config, sites, picker }
    }

    /// Sites that may run the workflow. An empty set is a valid answer.
    pub fn allowed_sites(&self, workflow: &str, input: &EligibilityInput) -> BTreeSet<SiteName> {
        let mut allowed = self.seed(input.io_class);
        log::debug!("{}: {:?} seeds {} sites", workflow, input.io_class, allowed.len());

        allowed = self.restrict_blow_up(workflow, allowed, &input.blow_up);

        for policy in input.campaigns {
            allowed = apply_campaign(workflow, allowed, policy);
        }

        allowed = self.restrict_capacity(workflow, allowed, input.memory_mb, input.multicore);

        if self.config.pick_one {
            allowed = self.picker.pick(&allowed, &self.sites).into_iter().collect();
            log::debug!("{}: single site mode picked {:?}", workflow, allowed);
        }

        allowed
    }

    fn seed(&self, io_class: IoClass) -> BTreeSet<SiteName> {
        let sites = &self.sites;
        match io_class {
            IoClass::Lhe => sites.eos.clone(),
            IoClass::Secondary { heavy_read: true } => sites.t1.union(&sites.good_io).cloned().collect(),
            IoClass::Secondary { heavy_read: false } => sites.t1.union(&sites.good_aaa).cloned().collect(),
            IoClass::Primary | IoClass::NoInput => sites.tier_sites(),
        }
    }

    /// Keeps only large sites when the blow-up is too high, unless none of
    /// the candidates is large.
    fn restrict_blow_up(&self, workflow: &str, allowed: BTreeSet<SiteName>, blow_up: &BlowupFactors) -> BTreeSet<SiteName> {
        if blow_up.max_blow_up <= self.config.max_blow_up {
            return allowed;
        }

        let large: BTreeSet<SiteName> = allowed.iter().filter(|s| self.sites.cpu_pledge(s) > self.config.needed_cores).cloned().collect();
        if large.is_empty() {
            return allowed;
        }

        log::debug!(
            "{}: restricting site white list because of blow-up factor: minChildJobPerEvent={:?} rootJobPerEvent={:?} maxBlowUp={}",
            workflow,
            blow_up.min_child_job_per_event,
            blow_up.root_job_per_event,
            blow_up.max_blow_up
        );
        large
    }

    fn restrict_capacity(&self, workflow: &str, allowed: BTreeSet<SiteName>, memory_mb: f64, multicore: u32) -> BTreeSet<SiteName> {
        let Some(mut memory_allowed) = self.sites.sites_by_memory(memory_mb, multicore) else {
            return allowed;
        };
        log::debug!("{}: sites allowing {} MB and ncores={} are {:?}", workflow, memory_mb, multicore, memory_allowed);

        if multicore > 1 {
            memory_allowed.retain(|s| self.sites.mcore_ready.contains(s));
        }
        allowed.intersection(&memory_allowed).cloned().collect()
    }
}

/// White list narrows, or replaces the set when nothing would survive.
/// Black list always subtracts.
pub fn apply_campaign(workflow: &str, allowed: BTreeSet<SiteName>, policy: &CampaignPolicy) -> BTreeSet<SiteName> {
    let mut allowed = allowed;

    if !policy.site_white_list.is_empty() {
        log::debug!("{}: using site white list of campaign {}: {:?}", workflow, policy.campaign_name, policy.site_white_list);
        allowed = allowed.intersection(&policy.site_white_list).cloned().collect();
        if allowed.is_empty() {
            allowed = policy.site_white_list.clone();
        }
    }

    if !policy.site_black_list.is_empty() {
        log::debug!("{}: removing black list of campaign {}: {:?}", workflow, policy.campaign_name, policy.site_black_list);
        allowed.retain(|s| !policy.site_black_list.contains(s));
    }

    allowed
}
