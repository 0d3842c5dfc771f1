use serde::{Deserialize, Serialize};

/// Campaign configuration as stored by the request manager. Older endpoints
/// wrap the record in a single-element list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CampaignConfigDto {
    // Tried first: a record would also accept an empty list.
    List(Vec<CampaignRecordDto>),
    Record(CampaignRecordDto),
}

impl CampaignConfigDto {
    pub fn into_record(self) -> Option<CampaignRecordDto> {
        match self {
            CampaignConfigDto::Record(record) => Some(record),
            CampaignConfigDto::List(records) => records.into_iter().next(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CampaignRecordDto {
    #[serde(rename = "CampaignName", default)]
    pub campaign_name: Option<String>,
    #[serde(rename = "SiteWhitelist", default)]
    pub site_whitelist: Vec<String>,
    #[serde(rename = "SiteBlacklist", default)]
    pub site_blacklist: Vec<String>,
}
