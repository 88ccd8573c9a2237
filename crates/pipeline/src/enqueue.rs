//! Typed enqueue helpers and the run-plus-job entry points used by triggers.
//!
//! Starting a stage always creates the run row and its job in one
//! transaction, so a run never exists without the job that will process it.

use adforge_core::creative::CreativeType;
use adforge_core::image_format::ImageFormat;
use adforge_core::job::{GenerationPayload, ImagesPayload, IngestionPayload};
use adforge_core::types::DbId;
use adforge_db::models::generation_run::{CreateGenerationRun, GenerationRun};
use adforge_db::models::ingestion_run::IngestionRun;
use adforge_db::models::job::Job;
use adforge_db::repositories::{GenerationRunRepo, IngestionRunRepo, JobRepo, ProjectRepo};
use sqlx::{PgExecutor, PgPool};

pub async fn enqueue_ingestion<'e, E: PgExecutor<'e>>(
    executor: E,
    ingestion_run_id: DbId,
    max_attempts: i32,
) -> Result<Job, sqlx::Error> {
    JobRepo::enqueue_with_max_attempts(executor, &IngestionPayload { ingestion_run_id }, max_attempts)
        .await
}

pub async fn enqueue_generation<'e, E: PgExecutor<'e>>(
    executor: E,
    generation_run_id: DbId,
    creative_type: CreativeType,
    max_attempts: i32,
) -> Result<Job, sqlx::Error> {
    let payload = GenerationPayload {
        generation_run_id,
        creative_type,
    };
    JobRepo::enqueue_with_max_attempts(executor, &payload, max_attempts).await
}

pub async fn enqueue_images<'e, E: PgExecutor<'e>>(
    executor: E,
    generation_run_id: DbId,
    formats: &[ImageFormat],
    max_attempts: i32,
) -> Result<Job, sqlx::Error> {
    let payload = ImagesPayload {
        generation_run_id,
        formats: formats.to_vec(),
    };
    JobRepo::enqueue_with_max_attempts(executor, &payload, max_attempts).await
}

/// Result of asking for a new ingestion.
#[derive(Debug)]
pub enum IngestionStart {
    Started { run: IngestionRun, job: Job },
    /// Another ingestion for the project is still queued, running or
    /// waiting out a retry backoff; nothing was created.
    InFlight { run_id: DbId },
}

/// Create a `QUEUED` ingestion run and its INGESTION job, unless the project
/// already has an ingestion in flight.
///
/// The project row is locked for the duration, so two concurrent requests
/// for one project cannot both start.
pub async fn start_ingestion(
    pool: &PgPool,
    project_id: DbId,
    input_url: &str,
    max_attempts: i32,
) -> Result<IngestionStart, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if !ProjectRepo::lock_for_update(&mut *tx, project_id).await? {
        return Err(sqlx::Error::RowNotFound);
    }
    if let Some(active) = IngestionRunRepo::find_active_for_project(&mut *tx, project_id).await? {
        tracing::info!(project_id, run_id = active.id, "Ingestion already in flight");
        return Ok(IngestionStart::InFlight { run_id: active.id });
    }

    let run = IngestionRunRepo::create(&mut *tx, project_id, input_url).await?;
    let job = enqueue_ingestion(&mut *tx, run.id, max_attempts).await?;
    tx.commit().await?;

    tracing::info!(run_id = run.id, job_id = job.id, project_id, "Ingestion enqueued");
    Ok(IngestionStart::Started { run, job })
}

/// Create a `QUEUED` generation run and its GENERATION job.
pub async fn start_generation(
    pool: &PgPool,
    input: &CreateGenerationRun,
    creative_type: CreativeType,
    max_attempts: i32,
) -> Result<(GenerationRun, Job), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let run = GenerationRunRepo::create(&mut *tx, input).await?;
    let job = enqueue_generation(&mut *tx, run.id, creative_type, max_attempts).await?;
    tx.commit().await?;

    tracing::info!(
        run_id = run.id,
        job_id = job.id,
        project_id = input.project_id,
        creative_type = %creative_type,
        "Generation enqueued",
    );
    Ok((run, job))
}
