//! Run status endpoints polled by clients after enqueueing work.

use adforge_core::creative::CreativeOutput;
use adforge_core::error::CoreError;
use adforge_core::export::{attachment_disposition, creative_csv, ExportFormat};
use adforge_core::types::DbId;
use adforge_db::models::generation_run::GenerationRun;
use adforge_db::models::visual_asset::VisualAsset;
use adforge_db::repositories::{GenerationRunRepo, IngestionRunRepo, VisualAssetRepo};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OperatorAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Error text for a CSV export of an output type with no tabular shape.
pub const CSV_NOT_SUPPORTED: &str = "csv_not_supported_for_type";

/// A generation run with the visuals rendered for it so far.
#[derive(Debug, Serialize)]
pub struct GenerationDetail {
    #[serde(flatten)]
    pub run: GenerationRun,
    pub assets: Vec<VisualAsset>,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

/// GET /api/v1/ingestion-runs/{id}
pub async fn get_ingestion_run(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(run_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let run = IngestionRunRepo::find_by_id(&state.pool, run_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "IngestionRun",
            id: run_id,
        }))?;
    Ok(Json(DataResponse { data: run }))
}

/// GET /api/v1/generations/{id}
pub async fn get_generation(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(run_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let run = find_generation(&state, run_id).await?;
    let assets = VisualAssetRepo::list_for_generation(&state.pool, run_id).await?;
    Ok(Json(DataResponse {
        data: GenerationDetail { run, assets },
    }))
}

/// GET /api/v1/generations/{id}/export?format=json|csv
///
/// Download the run's output. JSON is the stored output (`{}` before the run
/// succeeds); CSV covers META_ADS and GOOGLE_ADS only.
pub async fn export_generation(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(run_id): Path<DbId>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let run = find_generation(&state, run_id).await?;
    let format = ExportFormat::from_query(params.format.as_deref());

    let body = match format {
        ExportFormat::Json => {
            let output = run.output.unwrap_or_else(|| serde_json::json!({}));
            serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::InternalError(format!("export serialization failed: {e}")))?
        }
        ExportFormat::Csv => run
            .output
            .and_then(|value| serde_json::from_value::<CreativeOutput>(value).ok())
            .and_then(|output| creative_csv(&output))
            .ok_or_else(|| AppError::BadRequest(CSV_NOT_SUPPORTED.into()))?,
    };

    tracing::debug!(run_id, format = format.extension(), "Generation exported");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition(run.id, format)),
        ],
        body,
    ))
}

async fn find_generation(state: &AppState, run_id: DbId) -> AppResult<GenerationRun> {
    GenerationRunRepo::find_by_id(&state.pool, run_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "GenerationRun",
            id: run_id,
        }))
}
