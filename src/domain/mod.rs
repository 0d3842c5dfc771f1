pub mod catalog;
pub mod cost;
pub mod planner;
pub mod request;
pub mod site;
pub mod task;
pub mod utils;
