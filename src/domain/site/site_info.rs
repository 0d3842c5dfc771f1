use std::collections::{BTreeMap, BTreeSet};

use crate::api::site_dto::{MemorySlotDto, QualityDto, SiteDirectoryDto, TierDto};
use crate::domain::utils::id::SiteName;

/// Read-only view of the site directory, built once per run and shared by
/// every workflow of the batch.
#[derive(Debug, Clone, Default)]
pub struct SiteInfo {
    pub t1: BTreeSet<SiteName>,
    pub t2: BTreeSet<SiteName>,
    pub t3: BTreeSet<SiteName>,
    /// Sites that can read from the object store.
    pub eos: BTreeSet<SiteName>,
    /// Good transfer throughput.
    pub good_io: BTreeSet<SiteName>,
    /// Good wide-area read quality.
    pub good_aaa: BTreeSet<SiteName>,
    pub mcore_ready: BTreeSet<SiteName>,
    pub cpu_pledges: BTreeMap<SiteName, u64>,
    memory_slots: BTreeMap<SiteName, Vec<MemorySlotDto>>,
}

impl SiteInfo {
    pub fn from_dto(dto: SiteDirectoryDto) -> Self {
        let mut info = SiteInfo::default();

        for site in dto.sites {
            let name = SiteName::new(site.name);
            match site.tier {
                TierDto::T1 => info.t1.insert(name.clone()),
                TierDto::T2 => info.t2.insert(name.clone()),
                TierDto::T3 => info.t3.insert(name.clone()),
                TierDto::Eos => info.eos.insert(name.clone()),
            };
            if site.io_quality == QualityDto::Good {
                info.good_io.insert(name.clone());
            }
            if site.wide_area_read_quality == QualityDto::Good {
                info.good_aaa.insert(name.clone());
            }
            if site.mcore_ready {
                info.mcore_ready.insert(name.clone());
            }
            if let Some(slots) = site.memory_slots {
                info.memory_slots.insert(name.clone(), slots);
            }
            info.cpu_pledges.insert(name, site.cpu_pledge);
        }

        log::info!(
            "Site directory: {} T1, {} T2, {} T3, {} EOS, {} multicore ready",
            info.t1.len(),
            info.t2.len(),
            info.t3.len(),
            info.eos.len(),
            info.mcore_ready.len()
        );
        info
    }

    pub fn all_sites(&self) -> BTreeSet<SiteName> {
        self.cpu_pledges.keys().cloned().collect()
    }

    pub fn cpu_pledge(&self, site: &SiteName) -> u64 {
        self.cpu_pledges.get(site).copied().unwrap_or(0)
    }

    pub fn tier_sites(&self) -> BTreeSet<SiteName> {
        self.t1.iter().chain(&self.t2).chain(&self.t3).cloned().collect()
    }

    /// Sites with a slot offering at least `memory_mb` with `max_cores`
    /// cores. `None` when no site publishes memory information, in which
    /// case callers should not filter at all.
    pub fn sites_by_memory(&self, memory_mb: f64, max_cores: u32) -> Option<BTreeSet<SiteName>> {
        if self.memory_slots.is_empty() {
            return None;
        }

        let allowed = self
            .memory_slots
            .iter()
            .filter(|(_, slots)| slots.iter().any(|slot| slot.max_memory_mb >= memory_mb && slot.max_cores >= max_cores))
            .map(|(site, _)| site.clone())
            .collect();
        Some(allowed)
    }
}
