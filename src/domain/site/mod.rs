pub mod campaign_policy;
pub mod ce_picker;
pub mod eligibility;
pub mod site_info;
