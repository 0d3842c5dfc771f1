use std::sync::Arc;

use crate::api::config_dto::PlannerConfig;
use crate::api::site_dto::SiteDirectoryDto;
use crate::domain::planner::workflow_aggregator::{PlannerServices, WorkflowAggregator};
use crate::domain::site::site_info::SiteInfo;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;
use crate::services::dbs::DbsClient;
use crate::services::phedex::PhedexClient;
use crate::services::reqmgr::ReqMgrClient;
use crate::services::snapshot::SnapshotServices;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod services;

pub fn load_config(file_path: Option<&str>) -> Result<PlannerConfig> {
    let config = match file_path {
        Some(path) => parse_json_file::<PlannerConfig>(path)?,
        None => PlannerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

pub fn load_sites(file_path: &str) -> Result<Arc<SiteInfo>> {
    let dto: SiteDirectoryDto = parse_json_file(file_path)?;
    Ok(Arc::new(SiteInfo::from_dto(dto)))
}

/// Collaborators backed by the request manager, DBS and PhEDEx services
/// named in the configuration.
pub fn http_services(config: &PlannerConfig) -> Result<PlannerServices> {
    let services = &config.services;
    let required = |url: &Option<String>, key: &str| url.clone().ok_or_else(|| Error::InvalidConfig(format!("services.{} is not set", key)));
    let timeout = config.fan_out.item_timeout();

    let reqmgr = Arc::new(ReqMgrClient::new(&required(&services.reqmgr_url, "reqmgrUrl")?, timeout)?);
    let dbs = Arc::new(DbsClient::new(&required(&services.dbs_url, "dbsUrl")?, timeout)?);
    let phedex = Arc::new(PhedexClient::new(&required(&services.phedex_url, "phedexUrl")?, timeout)?);

    Ok(PlannerServices { workflows: reqmgr.clone(), catalog: dbs, locations: phedex, campaigns: reqmgr })
}

/// Builds a planner from a configuration and a site directory file, served
/// by a snapshot file when given and by the live services otherwise.
pub fn build_planner(config: &PlannerConfig, sites_path: &str, snapshot_path: Option<&str>) -> Result<WorkflowAggregator> {
    let sites = load_sites(sites_path)?;
    log::info!("Site directory '{}' loaded.", sites_path);

    let services = match snapshot_path {
        Some(path) => SnapshotServices::from_file(path)?.into_planner_services(),
        None => http_services(config)?,
    };

    Ok(WorkflowAggregator::new(services, sites, config))
}
