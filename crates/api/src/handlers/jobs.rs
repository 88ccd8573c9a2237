//! Read-only job inspection for operators.

use adforge_core::error::CoreError;
use adforge_core::types::DbId;
use adforge_db::models::job::JobListQuery;
use adforge_db::repositories::JobRepo;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OperatorAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/jobs
///
/// Newest first. Supports optional `status_id`, `limit`, and `offset`.
pub async fn list_jobs(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = JobRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    _auth: OperatorAuth,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;
    Ok(Json(DataResponse { data: job }))
}
