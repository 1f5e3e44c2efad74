pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod poller;
pub mod rate_limit;
pub mod riot;
