use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Planner configuration, read once per run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    pub blow_up_limits: BlowUpLimitsDto,
    pub fan_out: FanOutDto,
    pub copies: CopiesDto,
    pub services: ServicesDto,
    /// Reduce every allowed-site list to a single representative site.
    pub pick_one: bool,
    pub picker: PickerKind,
}

/// How the single representative site is chosen in pick-one mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PickerKind {
    #[default]
    LargestPledge,
    WeightedRandom,
}

/// Workflows whose blow-up factor exceeds `max_blow_up` are restricted to
/// sites pledging more than `needed_cores`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlowUpLimitsDto {
    pub max_blow_up: f64,
    pub needed_cores: u64,
}

impl Default for BlowUpLimitsDto {
    fn default() -> Self {
        BlowUpLimitsDto { max_blow_up: 1000.0, needed_cores: 4000 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FanOutDto {
    pub max_concurrency: usize,
    pub item_timeout_secs: u64,
    pub round_deadline_secs: u64,
}

impl Default for FanOutDto {
    fn default() -> Self {
        FanOutDto { max_concurrency: 16, item_timeout_secs: 30, round_deadline_secs: 300 }
    }
}

impl FanOutDto {
    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }

    pub fn round_deadline(&self) -> Duration {
        Duration::from_secs(self.round_deadline_secs)
    }
}

/// Parameters of the cpu-hours to copies step function.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopiesDto {
    pub min_copies: u32,
    pub max_copies: u32,
    pub weight: f64,
    pub constant: f64,
}

impl Default for CopiesDto {
    fn default() -> Self {
        CopiesDto { min_copies: 2, max_copies: 3, weight: 50000.0, constant: 100.0 }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesDto {
    pub reqmgr_url: Option<String>,
    pub dbs_url: Option<String>,
    pub phedex_url: Option<String>,
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fan_out.max_concurrency == 0 {
            return Err(Error::InvalidConfig("fanOut.maxConcurrency must be positive".to_string()));
        }
        if self.copies.min_copies > self.copies.max_copies {
            return Err(Error::InvalidConfig(format!(
                "copies.minCopies ({}) exceeds copies.maxCopies ({})",
                self.copies.min_copies, self.copies.max_copies
            )));
        }
        if self.copies.weight <= 0.0 {
            return Err(Error::InvalidConfig("copies.weight must be positive".to_string()));
        }
        if self.blow_up_limits.max_blow_up < 0.0 {
            return Err(Error::InvalidConfig("blowUpLimits.maxBlowUp must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: PlannerConfig = serde_json::from_str(r#"{"blowUpLimits": {"maxBlowUp": 50.0}, "pickOne": true}"#).unwrap();

        assert_eq!(config.blow_up_limits.max_blow_up, 50.0);
        assert_eq!(config.blow_up_limits.needed_cores, 4000);
        assert_eq!(config.fan_out.max_concurrency, 16);
        assert_eq!(config.copies.max_copies, 3);
        assert!(config.pick_one);
        assert_eq!(config.picker, PickerKind::LargestPledge);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_weighted_picker() {
        let config: PlannerConfig = serde_json::from_str(r#"{"picker": "weightedRandom"}"#).unwrap();

        assert_eq!(config.picker, PickerKind::WeightedRandom);
    }

    #[test]
    fn rejects_inverted_copy_bounds() {
        let mut config = PlannerConfig::default();
        config.copies.min_copies = 4;

        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
