use std::collections::BTreeSet;

use crate::api::campaign_dto::CampaignRecordDto;
use crate::domain::utils::id::{CampaignName, SiteName};

/// Site restrictions attached to a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignPolicy {
    pub campaign_name: CampaignName,
    pub site_white_list: BTreeSet<SiteName>,
    pub site_black_list: BTreeSet<SiteName>,
}

impl CampaignPolicy {
    /// The record's own name wins over the name it was looked up with.
    pub fn from_dto(looked_up: &CampaignName, dto: CampaignRecordDto) -> Self {
        CampaignPolicy {
            campaign_name: dto.campaign_name.filter(|n| !n.is_empty()).map(CampaignName::new).unwrap_or_else(|| looked_up.clone()),
            site_white_list: dto.site_whitelist.into_iter().filter(|s| !s.is_empty()).map(SiteName::new).collect(),
            site_black_list: dto.site_blacklist.into_iter().filter(|s| !s.is_empty()).map(SiteName::new).collect(),
        }
    }
}
