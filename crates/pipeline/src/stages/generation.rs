//! GENERATION: produce schema-valid creatives and fan out one IMAGES job.

use adforge_core::creative::CreativeType;
use adforge_core::job::GenerationPayload;
use adforge_core::types::DbId;
use adforge_db::models::generation_run::GenerationSuccess;
use adforge_db::models::status::RunStatus;
use adforge_db::repositories::{BrandRepo, GenerationRunRepo};

use crate::context::PipelineContext;
use crate::creative_engine::generate_creatives;
use crate::enqueue::enqueue_images;
use crate::error::{PipelineError, BRAND_DNA_NOT_FOUND, GENERATION_RUN_NOT_FOUND};
use crate::prompts::GenerationParameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed { images_job_id: DbId, repaired: bool },
    /// The run had already succeeded; no second IMAGES job is created.
    AlreadyCompleted,
}

pub async fn run(
    ctx: &PipelineContext,
    payload: &GenerationPayload,
) -> Result<GenerationOutcome, PipelineError> {
    let run_id = payload.generation_run_id;
    match execute(ctx, payload).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            super::record_run_failure(
                "generation",
                run_id,
                GenerationRunRepo::mark_failed(&ctx.pool, run_id, &e.to_string()),
            )
            .await;
            Err(e)
        }
    }
}

async fn execute(
    ctx: &PipelineContext,
    payload: &GenerationPayload,
) -> Result<GenerationOutcome, PipelineError> {
    let run_id = payload.generation_run_id;
    let run = GenerationRunRepo::find_by_id(&ctx.pool, run_id)
        .await?
        .ok_or_else(|| PipelineError::failed(GENERATION_RUN_NOT_FOUND))?;
    if run.status() == Some(RunStatus::Succeeded) {
        tracing::info!(run_id, "Generation run already succeeded, skipping");
        return Ok(GenerationOutcome::AlreadyCompleted);
    }
    if !GenerationRunRepo::mark_running(&ctx.pool, run_id).await? {
        tracing::info!(run_id, "Generation run succeeded concurrently, skipping");
        return Ok(GenerationOutcome::AlreadyCompleted);
    }

    // The run row is authoritative for the type.
    let creative_type: CreativeType = run.creative_type.parse()?;
    if creative_type != payload.creative_type {
        tracing::warn!(
            run_id,
            run_type = %creative_type,
            payload_type = %payload.creative_type,
            "Job payload type differs from run type; using run type",
        );
    }

    let dna = BrandRepo::find_dna(&ctx.pool, run.brand_dna_id)
        .await?
        .ok_or_else(|| PipelineError::failed(BRAND_DNA_NOT_FOUND))?;
    let params = GenerationParameters::from_value(&run.parameters);

    let result = generate_creatives(ctx.backend.as_ref(), creative_type, &dna.dna, &params).await?;
    let success = GenerationSuccess {
        output: serde_json::to_value(&result.output)
            .map_err(|e| PipelineError::failed(format!("output serialization failed: {e}")))?,
        model: result.model,
        usage: result.usage,
    };

    // Run success and the follow-on job commit together or not at all. An
    // overlapping delivery that already succeeded wins; this one enqueues
    // nothing.
    let mut tx = ctx.pool.begin().await?;
    if !GenerationRunRepo::mark_succeeded(&mut *tx, run_id, &success).await? {
        tx.rollback().await?;
        tracing::warn!(run_id, "Generation run already succeeded by another delivery");
        return Ok(GenerationOutcome::AlreadyCompleted);
    }
    let images_job = enqueue_images(
        &mut *tx,
        run_id,
        &ctx.config.image_formats,
        ctx.config.max_attempts,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        run_id,
        creative_type = %creative_type,
        repaired = result.repaired,
        images_job_id = images_job.id,
        "Generation succeeded",
    );
    Ok(GenerationOutcome::Completed {
        images_job_id: images_job.id,
        repaired: result.repaired,
    })
}
