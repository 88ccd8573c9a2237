//! Repository for the `ingestion_runs` table.

use adforge_core::job::JobType;
use adforge_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::ingestion_run::IngestionRun;
use crate::models::status::{JobStatus, RunStatus};

const COLUMNS: &str = "\
    id, project_id, input_url, status_id, error, brand_dna_id, stats, \
    started_at, finished_at, created_at, updated_at";

/// Provides lifecycle operations for ingestion runs.
pub struct IngestionRunRepo;

impl IngestionRunRepo {
    /// Create a `QUEUED` run.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: DbId,
        input_url: &str,
    ) -> Result<IngestionRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO ingestion_runs (project_id, input_url, status_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IngestionRun>(&query)
            .bind(project_id)
            .bind(input_url)
            .bind(RunStatus::Queued.id())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<IngestionRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ingestion_runs WHERE id = $1");
        sqlx::query_as::<_, IngestionRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The project's most recent ingestion that is still in flight.
    ///
    /// A run counts while it is `QUEUED`/`RUNNING`, and also while its
    /// INGESTION job is: a run marked `FAILED` by one attempt stays in flight
    /// until its job succeeds or exhausts its retries.
    pub async fn find_active_for_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: DbId,
    ) -> Result<Option<IngestionRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ingestion_runs r \
             WHERE r.project_id = $1 \
               AND (r.status_id IN ($2, $3) \
                    OR EXISTS ( \
                        SELECT 1 FROM jobs j \
                        WHERE j.job_type = $4 \
                          AND j.status_id IN ($5, $6) \
                          AND j.payload @> jsonb_build_object('ingestionRunId', r.id))) \
             ORDER BY r.created_at DESC, r.id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, IngestionRun>(&query)
            .bind(project_id)
            .bind(RunStatus::Queued.id())
            .bind(RunStatus::Running.id())
            .bind(JobType::Ingestion.as_str())
            .bind(JobStatus::Queued.id())
            .bind(JobStatus::Running.id())
            .fetch_optional(executor)
            .await
    }

    /// Move to `RUNNING`, stamping `started_at` and clearing any prior error.
    ///
    /// Returns `false` if the run is missing or already `SUCCEEDED`.
    pub async fn mark_running(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ingestion_runs \
             SET status_id = $2, started_at = NOW(), finished_at = NULL, error = NULL \
             WHERE id = $1 AND status_id <> $3",
        )
        .bind(id)
        .bind(RunStatus::Running.id())
        .bind(RunStatus::Succeeded.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal success, linking the Brand DNA snapshot the run produced.
    ///
    /// Returns `false` without writing when the run had already succeeded.
    pub async fn mark_succeeded<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        brand_dna_id: DbId,
        stats: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ingestion_runs \
             SET status_id = $2, brand_dna_id = $3, stats = $4, error = NULL, finished_at = NOW() \
             WHERE id = $1 AND status_id <> $2",
        )
        .bind(id)
        .bind(RunStatus::Succeeded.id())
        .bind(brand_dna_id)
        .bind(stats)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failure. A run that already succeeded is left untouched.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ingestion_runs \
             SET status_id = $2, error = $3, finished_at = NOW() \
             WHERE id = $1 AND status_id <> $4",
        )
        .bind(id)
        .bind(RunStatus::Failed.id())
        .bind(error)
        .bind(RunStatus::Succeeded.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
