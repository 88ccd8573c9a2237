//! Handlers for `/projects`: creation and the three enqueue endpoints.
//!
//! Each enqueue endpoint creates its run row and job together; the response
//! is 202 because the work happens on a later runner cycle.

use adforge_core::creative::CreativeType;
use adforge_core::error::CoreError;
use adforge_core::image_format::ImageFormat;
use adforge_core::types::DbId;
use adforge_db::models::generation_run::{CreateGenerationRun, GenerationRun};
use adforge_db::models::ingestion_run::IngestionRun;
use adforge_db::models::project::{CreateProject, Project};
use adforge_db::repositories::{GenerationRunRepo, ProjectRepo};
use adforge_pipeline::enqueue::{enqueue_images, start_generation, start_ingestion, IngestionStart};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OperatorAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Error text returned when generation is requested before any ingestion
/// succeeded.
pub const BRAND_DNA_REQUIRED: &str = "brand_dna_required";

/// Error text returned while an ingestion for the project is still in flight.
pub const INGESTION_IN_PROGRESS: &str = "ingestion_in_progress";

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(url)]
    pub primary_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "type")]
    pub creative_type: String,
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImagesRequest {
    pub generation_run_id: DbId,
    #[validate(length(min = 1))]
    pub formats: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub ingestion_run: IngestionRun,
    pub job_id: DbId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generation_run: GenerationRun,
    pub job_id: DbId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesResponse {
    pub ok: bool,
    pub job_id: DbId,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_project(state: &AppState, project_id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))
}

fn max_attempts(state: &AppState) -> i32 {
    state.runner.context().config.max_attempts
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
pub async fn create_project(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            name: input.name.trim().to_string(),
            primary_url: input.primary_url,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = find_project(&state, project_id).await?;
    Ok(Json(DataResponse { data: project }))
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/ingest
///
/// Start an ingestion of the project's primary URL. 409 while another
/// ingestion for the project is queued, running or waiting to retry.
pub async fn ingest(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = find_project(&state, project_id).await?;

    let started = start_ingestion(
        &state.pool,
        project.id,
        &project.primary_url,
        max_attempts(&state),
    )
    .await?;
    let (run, job) = match started {
        IngestionStart::Started { run, job } => (run, job),
        IngestionStart::InFlight { .. } => {
            return Err(AppError::Core(CoreError::Conflict(INGESTION_IN_PROGRESS.into())));
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            ingestion_run: run,
            job_id: job.id,
        }),
    ))
}

/// POST /api/v1/projects/{id}/generate
///
/// Start a generation against the project's active Brand DNA. 409 with
/// `brand_dna_required` when the project has none yet.
pub async fn generate(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let project = find_project(&state, project_id).await?;
    let brand_dna_id = project
        .active_brand_dna_id
        .ok_or_else(|| AppError::Core(CoreError::Conflict(BRAND_DNA_REQUIRED.into())))?;

    let creative_type: CreativeType = input.creative_type.parse()?;
    let parameters = match input.parameters {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(value @ serde_json::Value::Object(_)) => value,
        Some(_) => {
            return Err(AppError::BadRequest("parameters must be a JSON object".into()));
        }
    };

    let (run, job) = start_generation(
        &state.pool,
        &CreateGenerationRun {
            project_id: project.id,
            brand_dna_id,
            creative_type: creative_type.as_str().to_string(),
            parameters,
        },
        creative_type,
        max_attempts(&state),
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            generation_run: run,
            job_id: job.id,
        }),
    ))
}

/// POST /api/v1/projects/{id}/images
///
/// Request extra renders for a generation run of this project.
pub async fn request_images(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<ImagesRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let formats = input
        .formats
        .iter()
        .map(|f| f.parse::<ImageFormat>())
        .collect::<Result<Vec<_>, _>>()?;

    let run = GenerationRunRepo::find_by_id(&state.pool, input.generation_run_id)
        .await?
        .filter(|run| run.project_id == project_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "GenerationRun",
            id: input.generation_run_id,
        }))?;

    let job = enqueue_images(&state.pool, run.id, &formats, max_attempts(&state)).await?;
    tracing::info!(
        project_id,
        run_id = run.id,
        job_id = job.id,
        formats = formats.len(),
        "Images enqueued",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ImagesResponse {
            ok: true,
            job_id: job.id,
        }),
    ))
}
