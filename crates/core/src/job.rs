//! Job kinds, payload shapes and the retry arithmetic shared by the queue.
//!
//! The `jobs` row carries no domain semantics beyond dispatch: its payload
//! only references a pipeline run by id. Payload keys are camelCase on the
//! wire (`{"ingestionRunId": 1}`).

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::creative::CreativeType;
use crate::error::CoreError;
use crate::image_format::ImageFormat;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Queue constants
// ---------------------------------------------------------------------------

/// Claim attempts allowed per job unless the enqueuer overrides it.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Linear backoff step: a job that failed on claim `n` waits `n` steps.
pub const BACKOFF_STEP_SECS: i64 = 60;

/// Default lease timeout. Must exceed the slowest legitimate handler run.
pub const DEFAULT_LEASE_TIMEOUT_SECS: i64 = 15 * 60;

/// `last_error` written by the sweeper when a stale lease has no attempts left.
pub const LEASE_EXPIRED_ERROR: &str = "lease expired, attempts exhausted";

/// Batch size used by the operator trigger when `maxJobs` is absent or junk.
pub const DEFAULT_TRIGGER_BATCH: i64 = 5;

/// Upper bound on a single trigger's batch.
pub const MAX_TRIGGER_BATCH: i64 = 10;

/// The scheduler trigger processes one job per call to stay inside
/// serverless request limits.
pub const SCHEDULER_BATCH: i64 = 1;

// ---------------------------------------------------------------------------
// Job type
// ---------------------------------------------------------------------------

/// The stage a job belongs to. Stored as text in `jobs.job_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Ingestion,
    Generation,
    Images,
}

impl JobType {
    pub const ALL: [JobType; 3] = [JobType::Ingestion, JobType::Generation, JobType::Images];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Ingestion => "INGESTION",
            JobType::Generation => "GENERATION",
            JobType::Images => "IMAGES",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown job type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A payload struct bound to exactly one [`JobType`].
pub trait JobPayload: Serialize + DeserializeOwned {
    const JOB_TYPE: JobType;
}

/// Payload of an `INGESTION` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionPayload {
    pub ingestion_run_id: DbId,
}

impl JobPayload for IngestionPayload {
    const JOB_TYPE: JobType = JobType::Ingestion;
}

/// Payload of a `GENERATION` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    pub generation_run_id: DbId,
    #[serde(rename = "type")]
    pub creative_type: CreativeType,
}

impl JobPayload for GenerationPayload {
    const JOB_TYPE: JobType = JobType::Generation;
}

/// Payload of an `IMAGES` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesPayload {
    pub generation_run_id: DbId,
    pub formats: Vec<ImageFormat>,
}

impl JobPayload for ImagesPayload {
    const JOB_TYPE: JobType = JobType::Images;
}

// ---------------------------------------------------------------------------
// Retry arithmetic
// ---------------------------------------------------------------------------

/// Delay before a job that failed on claim number `attempts` is claimable again.
///
/// Linear, not exponential: worst-case latency stays predictable at the
/// small job volumes this queue is sized for.
pub fn retry_backoff(attempts: i32) -> Duration {
    Duration::seconds(BACKOFF_STEP_SECS * i64::from(attempts.max(0)))
}

/// What finalization does with a job whose handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Back to `QUEUED`, claimable again at `available_at`.
    Retry { available_at: Timestamp },
    /// Attempts used up: terminal `FAILED`.
    Exhausted,
}

/// Decide between retry and terminal failure for a failed handler run.
///
/// `attempts` is the post-claim value, i.e. it already counts the run that
/// just failed.
pub fn failure_disposition(attempts: i32, max_attempts: i32, now: Timestamp) -> FailureDisposition {
    if attempts < max_attempts {
        FailureDisposition::Retry {
            available_at: now + retry_backoff(attempts),
        }
    } else {
        FailureDisposition::Exhausted
    }
}

/// Clamp a caller-supplied `maxJobs` query value to `1..=MAX_TRIGGER_BATCH`.
///
/// Fractions are floored; anything that is not a finite number falls back to
/// [`DEFAULT_TRIGGER_BATCH`].
pub fn clamp_batch_size(requested: Option<&str>) -> i64 {
    let Some(raw) = requested else {
        return DEFAULT_TRIGGER_BATCH;
    };
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => (n.floor() as i64).clamp(1, MAX_TRIGGER_BATCH),
        _ => DEFAULT_TRIGGER_BATCH,
    }
}
