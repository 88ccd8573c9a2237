//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// POST   /                -> create_project
/// GET    /{id}            -> get_project
/// POST   /{id}/ingest     -> ingest
/// POST   /{id}/generate   -> generate
/// POST   /{id}/images     -> request_images
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(projects::create_project))
        .route("/{id}", get(projects::get_project))
        .route("/{id}/ingest", post(projects::ingest))
        .route("/{id}/generate", post(projects::generate))
        .route("/{id}/images", post(projects::request_images))
}
