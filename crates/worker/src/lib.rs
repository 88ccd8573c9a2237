//! Long-running polling worker: drives the job runner on a fixed interval
//! until shutdown.

pub mod config;
pub mod poller;
