pub mod catalog_joiner;
pub mod catalog_trait;
pub mod dataset_info;
pub mod fan_out;
