pub mod request_record;
pub mod request_type;
pub mod workflow_io;
