//! Repository for the `jobs` table: the durable work queue.
//!
//! Mutual exclusion rests entirely on the row: a claim flips `QUEUED` rows to
//! `RUNNING` inside one statement using `FOR UPDATE SKIP LOCKED`, and every
//! finalize is conditional on the caller still holding the lease.

use std::time::Duration;

use adforge_core::job::{
    failure_disposition, FailureDisposition, JobPayload, JobType, DEFAULT_MAX_ATTEMPTS,
    LEASE_EXPIRED_ERROR,
};
use adforge_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::job::{Job, JobListQuery, QueueSnapshot, SweepReport};
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_type, payload, status_id, attempts, max_attempts, \
    available_at, locked_at, locked_by, last_error, created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// How a failed job was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Requeued, claimable again at `available_at`.
    Retry { available_at: Timestamp },
    /// Terminal `FAILED`.
    Failed,
    /// The caller no longer held the lease; nothing was written.
    LeaseLost,
}

/// Provides queue operations for background jobs.
pub struct JobRepo;

impl JobRepo {
    /// Enqueue a typed payload with the default attempt budget.
    ///
    /// Accepts a pool or an open transaction so follow-on jobs can be
    /// enqueued atomically with the write that caused them.
    pub async fn enqueue<'e, P, E>(executor: E, payload: &P) -> Result<Job, sqlx::Error>
    where
        P: JobPayload,
        E: PgExecutor<'e>,
    {
        Self::enqueue_with_max_attempts(executor, payload, DEFAULT_MAX_ATTEMPTS).await
    }

    /// Enqueue a typed payload with an explicit attempt budget.
    pub async fn enqueue_with_max_attempts<'e, P, E>(
        executor: E,
        payload: &P,
        max_attempts: i32,
    ) -> Result<Job, sqlx::Error>
    where
        P: JobPayload,
        E: PgExecutor<'e>,
    {
        let json = serde_json::to_value(payload).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        Self::enqueue_raw(executor, P::JOB_TYPE, &json, max_attempts).await
    }

    /// Insert a new `QUEUED` row, claimable immediately.
    pub async fn enqueue_raw<'e, E: PgExecutor<'e>>(
        executor: E,
        job_type: JobType,
        payload: &serde_json::Value,
        max_attempts: i32,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_type, payload, status_id, attempts, max_attempts, available_at) \
             VALUES ($1, $2, $3, 0, $4, NOW()) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_type.as_str())
            .bind(payload)
            .bind(JobStatus::Queued.id())
            .bind(max_attempts)
            .fetch_one(executor)
            .await
    }

    /// Atomically lease up to `batch_size` claimable jobs for `worker_id`.
    ///
    /// Claimable means `QUEUED`, `available_at <= NOW()` and attempts left.
    /// Rows locked by a concurrent claimer are skipped, so concurrent callers
    /// always receive disjoint sets. The result is in FIFO order.
    pub async fn claim_batch(
        pool: &PgPool,
        worker_id: &str,
        batch_size: i64,
    ) -> Result<Vec<Job>, sqlx::Error> {
        if batch_size <= 0 {
            return Ok(Vec::new());
        }

        let query = format!(
            "WITH picked AS ( \
                 SELECT id FROM jobs \
                 WHERE status_id = $3 \
                   AND available_at <= NOW() \
                   AND attempts < max_attempts \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT $4 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             UPDATE jobs \
             SET status_id = $2, locked_at = NOW(), locked_by = $1, \
                 attempts = attempts + 1, last_error = NULL \
             WHERE id IN (SELECT id FROM picked) \
             RETURNING {COLUMNS}"
        );
        let mut jobs = sqlx::query_as::<_, Job>(&query)
            .bind(worker_id)
            .bind(JobStatus::Running.id())
            .bind(JobStatus::Queued.id())
            .bind(batch_size)
            .fetch_all(pool)
            .await?;

        // RETURNING order is unspecified.
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }

    /// Release leases older than `lease_timeout`.
    ///
    /// Exhausted jobs become `FAILED` with [`LEASE_EXPIRED_ERROR`]; the rest
    /// go back to `QUEUED` with `attempts` unchanged. Both updates commit
    /// together. Running it twice in a row changes nothing the second time.
    pub async fn sweep_expired_leases(
        pool: &PgPool,
        lease_timeout: Duration,
    ) -> Result<SweepReport, sqlx::Error> {
        let timeout_secs = lease_timeout.as_secs_f64();
        let mut tx = pool.begin().await?;

        let failed = sqlx::query(
            "UPDATE jobs \
             SET status_id = $1, locked_at = NULL, locked_by = NULL, last_error = $2 \
             WHERE status_id = $3 \
               AND locked_at IS NOT NULL \
               AND locked_at < NOW() - ($4 * INTERVAL '1 second') \
               AND attempts >= max_attempts",
        )
        .bind(JobStatus::Failed.id())
        .bind(LEASE_EXPIRED_ERROR)
        .bind(JobStatus::Running.id())
        .bind(timeout_secs)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let requeued = sqlx::query(
            "UPDATE jobs \
             SET status_id = $1, locked_at = NULL, locked_by = NULL \
             WHERE status_id = $2 \
               AND locked_at IS NOT NULL \
               AND locked_at < NOW() - ($3 * INTERVAL '1 second') \
               AND attempts < max_attempts",
        )
        .bind(JobStatus::Queued.id())
        .bind(JobStatus::Running.id())
        .bind(timeout_secs)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(SweepReport { failed, requeued })
    }

    /// Mark a leased job `SUCCEEDED`.
    ///
    /// Only the status changes; `locked_at`/`locked_by` stay as a record of
    /// which worker finished the job. Returns `false` when `worker_id` no
    /// longer holds the lease, in which case nothing is written.
    pub async fn mark_succeeded(
        pool: &PgPool,
        job_id: DbId,
        worker_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $3 \
             WHERE id = $1 AND status_id = $4 AND locked_by = $2",
        )
        .bind(job_id)
        .bind(worker_id)
        .bind(JobStatus::Succeeded.id())
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a handler failure on a leased job.
    ///
    /// `attempts`/`max_attempts` are the values returned by the claim. With
    /// attempts left the job is requeued with linear backoff; otherwise it is
    /// terminally `FAILED`. `error` is kept in `last_error` either way.
    pub async fn mark_failed(
        pool: &PgPool,
        job: &Job,
        worker_id: &str,
        error: &str,
    ) -> Result<FailureOutcome, sqlx::Error> {
        let now = chrono::Utc::now();
        let (status, available_at, outcome) =
            match failure_disposition(job.attempts, job.max_attempts, now) {
                FailureDisposition::Retry { available_at } => (
                    JobStatus::Queued,
                    available_at,
                    FailureOutcome::Retry { available_at },
                ),
                FailureDisposition::Exhausted => (JobStatus::Failed, now, FailureOutcome::Failed),
            };

        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $3, last_error = $4, available_at = $5, \
                 locked_at = NULL, locked_by = NULL \
             WHERE id = $1 AND status_id = $6 AND locked_by = $2",
        )
        .bind(job.id)
        .bind(worker_id)
        .bind(status.id())
        .bind(error)
        .bind(available_at)
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(FailureOutcome::LeaseLost);
        }
        Ok(outcome)
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs, newest first, optionally filtered by status.
    pub async fn list(pool: &PgPool, params: &JobListQuery) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(params.status_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts by state plus the age of the oldest lease, in one scan.
    pub async fn queue_snapshot(pool: &PgPool) -> Result<QueueSnapshot, sqlx::Error> {
        sqlx::query_as::<_, QueueSnapshot>(
            "SELECT \
                 COUNT(*) FILTER (WHERE status_id = $1) AS queued, \
                 COUNT(*) FILTER (WHERE status_id = $1 \
                                    AND available_at <= NOW() \
                                    AND attempts < max_attempts) AS ready, \
                 COUNT(*) FILTER (WHERE status_id = $2) AS running, \
                 EXTRACT(EPOCH FROM NOW() - MIN(locked_at) FILTER (WHERE status_id = $2))::FLOAT8 \
                     AS oldest_lease_secs \
             FROM jobs",
        )
        .bind(JobStatus::Queued.id())
        .bind(JobStatus::Running.id())
        .fetch_one(pool)
        .await
    }

    /// Count jobs of one type whose payload contains `fragment` (JSONB `@>`).
    pub async fn count_by_payload(
        pool: &PgPool,
        job_type: JobType,
        fragment: &serde_json::Value,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE job_type = $1 AND payload @> $2")
                .bind(job_type.as_str())
                .bind(fragment)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
