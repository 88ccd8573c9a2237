//! INGESTION: fetch site pages, synthesize Brand DNA, activate it.

use adforge_core::job::IngestionPayload;
use adforge_core::types::DbId;
use adforge_db::models::brand::NewBrandPage;
use adforge_db::models::status::RunStatus;
use adforge_db::repositories::{BrandRepo, IngestionRunRepo, ProjectRepo};

use crate::brand_analyzer::{analyze_brand, build_corpus};
use crate::context::PipelineContext;
use crate::error::{PipelineError, INGESTION_RUN_NOT_FOUND, NO_PAGES_SCRAPED};

/// What a successful ingestion produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    Completed { brand_dna_id: DbId, pages: usize },
    /// The run had already succeeded (job re-delivered after a crash).
    AlreadyCompleted,
}

pub async fn run(
    ctx: &PipelineContext,
    payload: &IngestionPayload,
) -> Result<IngestionOutcome, PipelineError> {
    let run_id = payload.ingestion_run_id;
    match execute(ctx, run_id).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            super::record_run_failure(
                "ingestion",
                run_id,
                IngestionRunRepo::mark_failed(&ctx.pool, run_id, &e.to_string()),
            )
            .await;
            Err(e)
        }
    }
}

async fn execute(ctx: &PipelineContext, run_id: DbId) -> Result<IngestionOutcome, PipelineError> {
    let run = IngestionRunRepo::find_by_id(&ctx.pool, run_id)
        .await?
        .ok_or_else(|| PipelineError::failed(INGESTION_RUN_NOT_FOUND))?;
    if run.status() == Some(RunStatus::Succeeded) {
        tracing::info!(run_id, "Ingestion run already succeeded, skipping");
        return Ok(IngestionOutcome::AlreadyCompleted);
    }
    if !IngestionRunRepo::mark_running(&ctx.pool, run_id).await? {
        tracing::info!(run_id, "Ingestion run succeeded concurrently, skipping");
        return Ok(IngestionOutcome::AlreadyCompleted);
    }

    let pages = ctx.fetcher.fetch_pages(&run.input_url).await?;
    if pages.is_empty() {
        return Err(PipelineError::failed(NO_PAGES_SCRAPED));
    }

    let new_pages: Vec<NewBrandPage> = pages
        .iter()
        .map(|p| NewBrandPage {
            url: p.url.clone(),
            title: p.title.clone(),
            content: p.content.clone(),
            content_sha: p.content_sha(),
        })
        .collect();
    let stored = BrandRepo::insert_pages(&ctx.pool, run.project_id, &new_pages).await?;

    let corpus = build_corpus(&pages);
    let analysis = analyze_brand(ctx.backend.as_ref(), &run.input_url, &pages).await?;
    let dna_json = serde_json::to_value(&analysis.dna)
        .map_err(|e| PipelineError::failed(format!("brand DNA serialization failed: {e}")))?;
    let stats = serde_json::json!({
        "pages": pages.len(),
        "pagesStored": stored,
        "model": analysis.model,
        "usage": analysis.usage,
    });

    let mut tx = ctx.pool.begin().await?;
    let dna = BrandRepo::create_dna(&mut *tx, run.project_id, &dna_json, &corpus).await?;
    ProjectRepo::set_active_brand_dna(&mut *tx, run.project_id, dna.id).await?;
    if !IngestionRunRepo::mark_succeeded(&mut *tx, run_id, dna.id, &stats).await? {
        // Drops the Brand DNA and activation written above.
        tx.rollback().await?;
        tracing::warn!(run_id, "Ingestion run already succeeded by another delivery");
        return Ok(IngestionOutcome::AlreadyCompleted);
    }
    tx.commit().await?;

    tracing::info!(
        run_id,
        project_id = run.project_id,
        brand_dna_id = dna.id,
        pages = pages.len(),
        "Ingestion succeeded",
    );
    Ok(IngestionOutcome::Completed {
        brand_dna_id: dna.id,
        pages: pages.len(),
    })
}
