pub mod blowup;
pub mod splitting;
pub mod task_node;
pub mod task_walker;
