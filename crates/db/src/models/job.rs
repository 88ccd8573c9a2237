//! Job queue rows.

use adforge_core::job::JobType;
use adforge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{serialize_job_status, JobStatus, StatusId};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: DbId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: serde_json::Value,
    #[serde(rename = "status", serialize_with = "serialize_job_status")]
    pub status_id: StatusId,
    pub attempts: i32,
    pub max_attempts: i32,
    pub available_at: Timestamp,
    pub locked_at: Option<Timestamp>,
    pub locked_by: Option<String>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_id(self.status_id)
    }

    /// Parsed `job_type`. The column CHECK keeps this in the known set.
    pub fn kind(&self) -> Result<JobType, adforge_core::error::CoreError> {
        self.job_type.parse()
    }
}

/// Outcome of one recovery sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Stale leases moved to `FAILED` because attempts were exhausted.
    pub failed: u64,
    /// Stale leases returned to `QUEUED`.
    pub requeued: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.failed == 0 && self.requeued == 0
    }
}

/// Point-in-time queue counts for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow, Serialize)]
pub struct QueueSnapshot {
    /// All `QUEUED` rows, including those waiting out a backoff.
    pub queued: i64,
    /// `QUEUED` rows a claim would pick up right now.
    pub ready: i64,
    pub running: i64,
    /// Age of the oldest `RUNNING` lease, if any.
    pub oldest_lease_secs: Option<f64>,
}

impl QueueSnapshot {
    /// Whether some lease has outlived `lease_timeout` (nothing has swept it).
    pub fn has_stale_lease(&self, lease_timeout: std::time::Duration) -> bool {
        self.oldest_lease_secs
            .is_some_and(|age| age > lease_timeout.as_secs_f64())
    }
}

/// Query parameters for listing jobs.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub status_id: Option<StatusId>,
    /// Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
