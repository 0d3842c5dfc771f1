pub mod placement_plan;
pub mod planning_report;
pub mod workflow_aggregator;
