use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDirectoryDto {
    pub sites: Vec<SiteDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDto {
    pub name: String,
    pub tier: TierDto,
    #[serde(default)]
    pub cpu_pledge: u64,
    /// Transfer throughput quality.
    #[serde(default)]
    pub io_quality: QualityDto,
    /// Remote (wide-area) read quality.
    #[serde(default)]
    pub wide_area_read_quality: QualityDto,
    #[serde(default)]
    pub mcore_ready: bool,
    /// `None` when the site publishes no memory information.
    #[serde(default)]
    pub memory_slots: Option<Vec<MemorySlotDto>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TierDto {
    T1,
    T2,
    T3,
    #[serde(rename = "EOS")]
    Eos,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDto {
    Good,
    #[default]
    Poor,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySlotDto {
    pub max_memory_mb: f64,
    pub max_cores: u32,
}
