//! Repository for the `generation_runs` table.

use adforge_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::generation_run::{CreateGenerationRun, GenerationRun, GenerationSuccess};
use crate::models::status::RunStatus;

const COLUMNS: &str = "\
    id, project_id, brand_dna_id, creative_type, parameters, status_id, error, \
    output, model, usage, started_at, finished_at, created_at, updated_at";

/// Provides lifecycle operations for generation runs.
pub struct GenerationRunRepo;

impl GenerationRunRepo {
    /// Create a `QUEUED` run.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateGenerationRun,
    ) -> Result<GenerationRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_runs (project_id, brand_dna_id, creative_type, parameters, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationRun>(&query)
            .bind(input.project_id)
            .bind(input.brand_dna_id)
            .bind(&input.creative_type)
            .bind(&input.parameters)
            .bind(RunStatus::Queued.id())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GenerationRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_runs WHERE id = $1");
        sqlx::query_as::<_, GenerationRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move to `RUNNING`, stamping `started_at` and clearing any prior error.
    ///
    /// Returns `false` if the run is missing or already `SUCCEEDED`.
    pub async fn mark_running(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_runs \
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

    /// Terminal success with schema-valid output.
    ///
    /// Only the first caller wins: returns `false` when the run had already
    /// succeeded, in which case nothing is written. Concurrent callers
    /// serialize on the row lock and the loser re-reads the committed status.
    pub async fn mark_succeeded<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        success: &GenerationSuccess,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_runs \
             SET status_id = $2, output = $3, model = $4, usage = $5, \
                 error = NULL, finished_at = NOW() \
             WHERE id = $1 AND status_id <> $2",
        )
        .bind(id)
        .bind(RunStatus::Succeeded.id())
        .bind(&success.output)
        .bind(&success.model)
        .bind(&success.usage)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failure. A run that already succeeded is left untouched.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_runs \
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
