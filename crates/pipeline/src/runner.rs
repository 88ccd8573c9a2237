//! One polling cycle: sweep, claim, dispatch, finalize.
//!
//! [`JobRunner::run_once`] is the single entry point shared by every trigger
//! (HTTP cron, operator endpoint, persistent worker). It never lets a handler
//! error escape; each job is finalized on its own.

use adforge_core::job::{GenerationPayload, ImagesPayload, IngestionPayload, JobPayload, JobType};
use adforge_core::types::DbId;
use adforge_db::models::job::Job;
use adforge_db::repositories::{FailureOutcome, JobRepo};
use serde::Serialize;

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::stages;

/// How one claimed job ended this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobResultStatus {
    Succeeded,
    /// Failed with attempts left; requeued with backoff.
    Retry,
    /// Failed with attempts exhausted.
    Failed,
    /// This worker no longer held the lease when finalizing, or the
    /// finalize write itself failed; the sweeper owns the row now.
    LeaseLost,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub id: DbId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobResultStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub worker_id: String,
    pub claimed: usize,
    pub results: Vec<JobResult>,
}

/// A fresh, unique worker identity such as `api-0190c6c1-...`.
pub fn worker_identity(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::now_v7())
}

/// Drives claimed jobs through their stage handlers.
#[derive(Clone)]
pub struct JobRunner {
    ctx: PipelineContext,
}

impl JobRunner {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Run one cycle for `worker_id`, processing at most `batch_size` jobs.
    ///
    /// Sweep failures are logged and do not block the claim. Claim failures
    /// are returned; nothing has been leased in that case.
    pub async fn run_once(
        &self,
        worker_id: &str,
        batch_size: i64,
    ) -> Result<RunSummary, PipelineError> {
        match JobRepo::sweep_expired_leases(&self.ctx.pool, self.ctx.config.lease_timeout).await {
            Ok(report) if !report.is_empty() => {
                tracing::warn!(
                    failed = report.failed,
                    requeued = report.requeued,
                    "Recovered expired job leases",
                );
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Lease sweep failed"),
        }

        let jobs = JobRepo::claim_batch(&self.ctx.pool, worker_id, batch_size).await?;
        if !jobs.is_empty() {
            tracing::info!(worker_id, claimed = jobs.len(), "Claimed jobs");
        }

        let mut results = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let status = self.process(worker_id, job).await;
            results.push(JobResult {
                id: job.id,
                job_type: job.job_type.clone(),
                status,
            });
        }

        Ok(RunSummary {
            worker_id: worker_id.to_string(),
            claimed: jobs.len(),
            results,
        })
    }

    async fn process(&self, worker_id: &str, job: &Job) -> JobResultStatus {
        tracing::info!(
            job_id = job.id,
            job_type = %job.job_type,
            attempts = job.attempts,
            max_attempts = job.max_attempts,
            "Processing job",
        );

        match dispatch(&self.ctx, job).await {
            Ok(()) => match JobRepo::mark_succeeded(&self.ctx.pool, job.id, worker_id).await {
                Ok(true) => {
                    tracing::info!(job_id = job.id, "Job succeeded");
                    JobResultStatus::Succeeded
                }
                Ok(false) => {
                    tracing::warn!(job_id = job.id, worker_id, "Lease lost before success was recorded");
                    JobResultStatus::LeaseLost
                }
                Err(e) => {
                    tracing::error!(job_id = job.id, error = %e, "Failed to record job success");
                    JobResultStatus::LeaseLost
                }
            },
            Err(handler_err) => {
                let message = handler_err.to_string();
                tracing::error!(job_id = job.id, job_type = %job.job_type, error = %message, "Job failed");

                match JobRepo::mark_failed(&self.ctx.pool, job, worker_id, &message).await {
                    Ok(FailureOutcome::Retry { available_at }) => {
                        tracing::info!(job_id = job.id, %available_at, "Job requeued");
                        JobResultStatus::Retry
                    }
                    Ok(FailureOutcome::Failed) => JobResultStatus::Failed,
                    Ok(FailureOutcome::LeaseLost) => {
                        tracing::warn!(job_id = job.id, worker_id, "Lease lost before failure was recorded");
                        JobResultStatus::LeaseLost
                    }
                    Err(e) => {
                        tracing::error!(job_id = job.id, error = %e, "Failed to record job failure");
                        JobResultStatus::LeaseLost
                    }
                }
            }
        }
    }
}

/// Route a claimed job to its stage handler.
async fn dispatch(ctx: &PipelineContext, job: &Job) -> Result<(), PipelineError> {
    match job.kind()? {
        JobType::Ingestion => {
            let payload: IngestionPayload = decode(job)?;
            stages::ingestion::run(ctx, &payload).await?;
        }
        JobType::Generation => {
            let payload: GenerationPayload = decode(job)?;
            stages::generation::run(ctx, &payload).await?;
        }
        JobType::Images => {
            let payload: ImagesPayload = decode(job)?;
            let outcome = stages::images::run(ctx, &payload).await?;
            if !outcome.failed.is_empty() {
                tracing::warn!(
                    job_id = job.id,
                    rendered = outcome.rendered.len(),
                    failed = outcome.failed.len(),
                    "Images job finished with skipped formats",
                );
            }
        }
    }
    Ok(())
}

fn decode<P: JobPayload>(job: &Job) -> Result<P, PipelineError> {
    serde_json::from_value(job.payload.clone()).map_err(|source| PipelineError::Payload {
        job_type: P::JOB_TYPE,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_identities_are_unique_and_prefixed() {
        let a = worker_identity("api");
        let b = worker_identity("api");
        assert!(a.starts_with("api-"));
        assert_ne!(a, b);
    }

    #[test]
    fn result_status_serializes_screaming() {
        let json = serde_json::to_value(JobResult {
            id: 1,
            job_type: "IMAGES".into(),
            status: JobResultStatus::LeaseLost,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "type": "IMAGES", "status": "LEASE_LOST"}));
    }
}
