pub mod campaign_dto;
pub mod config_dto;
pub mod dbs_dto;
pub mod phedex_dto;
pub mod reqmgr_dto;
pub mod request_dto;
pub mod site_dto;
pub mod snapshot_dto;
