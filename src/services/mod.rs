pub mod dbs;
pub mod http;
pub mod phedex;
pub mod reqmgr;
pub mod snapshot;
