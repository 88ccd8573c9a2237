//! IMAGES: render one visual per requested format.
//!
//! Best effort per format: a failed format is logged and skipped, and the
//! parent generation run is never touched.

use adforge_core::brand_dna::BrandDna;
use adforge_core::creative::CreativeType;
use adforge_core::image_format::ImageFormat;
use adforge_core::job::ImagesPayload;
use adforge_db::models::generation_run::GenerationRun;
use adforge_db::models::visual_asset::{CreateVisualAsset, VisualAsset};
use adforge_db::repositories::{BrandRepo, GenerationRunRepo, VisualAssetRepo};
use adforge_llm::ImageRequest;

use crate::context::PipelineContext;
use crate::error::{PipelineError, BRAND_DNA_NOT_FOUND, GENERATION_RUN_NOT_FOUND};
use crate::prompts::build_image_prompt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagesOutcome {
    pub rendered: Vec<ImageFormat>,
    pub failed: Vec<ImageFormat>,
}

pub async fn run(
    ctx: &PipelineContext,
    payload: &ImagesPayload,
) -> Result<ImagesOutcome, PipelineError> {
    let run = GenerationRunRepo::find_by_id(&ctx.pool, payload.generation_run_id)
        .await?
        .ok_or_else(|| PipelineError::failed(GENERATION_RUN_NOT_FOUND))?;
    let creative_type: CreativeType = run.creative_type.parse()?;
    let record = BrandRepo::find_dna(&ctx.pool, run.brand_dna_id)
        .await?
        .ok_or_else(|| PipelineError::failed(BRAND_DNA_NOT_FOUND))?;
    let dna = BrandDna::from_value(record.dna).unwrap_or_else(|e| {
        tracing::warn!(run_id = run.id, error = %e, "Stored brand DNA unreadable, using defaults");
        BrandDna::default()
    });

    let mut outcome = ImagesOutcome::default();
    for &format in &payload.formats {
        match render(ctx, &run, creative_type, &dna, format).await {
            Ok(asset) => {
                tracing::info!(run_id = run.id, asset_id = asset.id, format = %format, "Rendered visual");
                outcome.rendered.push(format);
            }
            Err(e) => {
                tracing::warn!(run_id = run.id, format = %format, error = %e, "Visual failed, skipping");
                outcome.failed.push(format);
            }
        }
    }
    Ok(outcome)
}

async fn render(
    ctx: &PipelineContext,
    run: &GenerationRun,
    creative_type: CreativeType,
    dna: &BrandDna,
    format: ImageFormat,
) -> Result<VisualAsset, PipelineError> {
    let size = format.size();
    let prompt = build_image_prompt(creative_type, dna, format);
    let image = ctx
        .backend
        .generate_image(&ImageRequest {
            prompt: prompt.clone(),
            size: size.as_param(),
        })
        .await?;

    let asset = VisualAssetRepo::create(
        &ctx.pool,
        &CreateVisualAsset {
            generation_run_id: run.id,
            format: format.as_str().to_string(),
            width: size.width,
            height: size.height,
            prompt,
            result_url: image.result_url,
            model: image.model,
        },
    )
    .await?;
    Ok(asset)
}
