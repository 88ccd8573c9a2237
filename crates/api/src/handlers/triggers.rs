//! Handlers that run one runner cycle on demand.
//!
//! Both triggers share [`JobRunner::run_once`](adforge_pipeline::JobRunner::run_once);
//! each call gets a fresh worker identity.

use adforge_core::job::{clamp_batch_size, SCHEDULER_BATCH};
use adforge_pipeline::runner::worker_identity;
use adforge_pipeline::JobResult;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::{CronCaller, OperatorAuth};
use crate::state::AppState;

/// Body returned by the scheduler trigger.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub claimed: usize,
    pub results: Vec<JobResult>,
}

/// Body returned by the operator trigger.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub ok: bool,
    pub claimed: usize,
    pub results: Vec<JobResult>,
}

/// `?maxJobs=` is kept as raw text so junk values fall back to the default
/// instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    #[serde(rename = "maxJobs")]
    pub max_jobs: Option<String>,
}

/// GET|POST /api/v1/cron/process-jobs
///
/// Sweep expired leases and process a single job.
pub async fn process_jobs_cron(
    caller: CronCaller,
    State(state): State<AppState>,
) -> AppResult<Json<TriggerResponse>> {
    let worker_id = worker_identity("cron");
    let summary = state.runner.run_once(&worker_id, SCHEDULER_BATCH).await?;

    tracing::info!(
        via = ?caller.via,
        worker_id = %summary.worker_id,
        claimed = summary.claimed,
        "Scheduler trigger finished",
    );

    Ok(Json(TriggerResponse {
        claimed: summary.claimed,
        results: summary.results,
    }))
}

/// POST /api/v1/jobs/process?maxJobs=N
///
/// Sweep and process up to `maxJobs` jobs (1..=10, default 5).
pub async fn process_jobs(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
) -> AppResult<Json<ProcessResponse>> {
    let batch_size = clamp_batch_size(params.max_jobs.as_deref());
    let worker_id = worker_identity("operator");
    let summary = state.runner.run_once(&worker_id, batch_size).await?;

    tracing::info!(
        worker_id = %summary.worker_id,
        batch_size,
        claimed = summary.claimed,
        "Operator trigger finished",
    );

    Ok(Json(ProcessResponse {
        ok: true,
        claimed: summary.claimed,
        results: summary.results,
    }))
}
