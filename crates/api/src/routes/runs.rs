//! Route definitions for run status lookups.

use axum::routing::get;
use axum::Router;

use crate::handlers::runs;
use crate::state::AppState;

/// ```text
/// GET    /ingestion-runs/{id}       -> get_ingestion_run
/// GET    /generations/{id}          -> get_generation
/// GET    /generations/{id}/export   -> export_generation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingestion-runs/{id}", get(runs::get_ingestion_run))
        .route("/generations/{id}", get(runs::get_generation))
        .route("/generations/{id}/export", get(runs::export_generation))
}
