//! The three-stage content pipeline and the runner that drives it.
//!
//! A trigger (HTTP handler, cron, persistent loop) calls
//! [`runner::JobRunner::run_once`]; the runner sweeps stale leases, claims a
//! batch, dispatches each job to its stage handler and finalizes it.

pub mod brand_analyzer;
pub mod config;
pub mod context;
pub mod creative_engine;
pub mod enqueue;
pub mod error;
pub mod fetcher;
pub mod prompts;
pub mod runner;
pub mod stages;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::PipelineError;
pub use runner::{JobResult, JobResultStatus, JobRunner, RunSummary};
