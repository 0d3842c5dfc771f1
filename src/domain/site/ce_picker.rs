use rand::Rng;
use std::collections::BTreeSet;

use crate::domain::site::site_info::SiteInfo;
use crate::domain::utils::id::SiteName;

/// Chooses one representative site out of a candidate set.
pub trait CePicker: Send + Sync {
    fn pick(&self, candidates: &BTreeSet<SiteName>, sites: &SiteInfo) -> Option<SiteName>;
}

/// Site with the largest CPU pledge; ties go to the lexicographically
/// smallest name.
#[derive(Debug, Default, Clone, Copy)]
pub struct LargestPledgePicker;

impl CePicker for LargestPledgePicker {
    fn pick(&self, candidates: &BTreeSet<SiteName>, sites: &SiteInfo) -> Option<SiteName> {
        let mut best: Option<(&SiteName, u64)> = None;
        for site in candidates {
            let pledge = sites.cpu_pledge(site);
            if best.is_none_or(|(_, top)| pledge > top) {
                best = Some((site, pledge));
            }
        }
        best.map(|(site, _)| site.clone())
    }
}

/// Random site, weighted by CPU pledge. Falls back to a uniform choice when
/// no candidate pledges anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedRandomPicker;

impl CePicker for WeightedRandomPicker {
    fn pick(&self, candidates: &BTreeSet<SiteName>, sites: &SiteInfo) -> Option<SiteName> {
        if candidates.is_empty() {
            return None;
        }

        let mut rng = rand::rng();
        let total: u64 = candidates.iter().map(|s| sites.cpu_pledge(s)).sum();
        if total == 0 {
            let idx = rng.random_range(0..candidates.len());
            return candidates.iter().nth(idx).cloned();
        }

        let r = rng.random_range(0..total);
        let mut cumulative = 0u64;
        for site in candidates {
            cumulative += sites.cpu_pledge(site);
            if r < cumulative {
                return Some(site.clone());
            }
        }
        candidates.iter().next_back().cloned()
    }
}
