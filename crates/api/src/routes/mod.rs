pub mod health;
pub mod jobs;
pub mod projects;
pub mod runs;

use axum::routing::get;
use axum::Router;

use crate::handlers::triggers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /cron/process-jobs                               scheduler trigger (GET, POST)
///
/// /jobs                                            list (operator)
/// /jobs/process                                    operator trigger (POST)
/// /jobs/{id}                                       get
///
/// /projects                                        create
/// /projects/{id}                                   get
/// /projects/{id}/ingest                            start ingestion (POST)
/// /projects/{id}/generate                          start generation (POST)
/// /projects/{id}/images                            request renders (POST)
///
/// /ingestion-runs/{id}                             get
/// /generations/{id}                                get, with visual assets
/// /generations/{id}/export                         download output (json, csv)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cron/process-jobs",
            get(triggers::process_jobs_cron).post(triggers::process_jobs_cron),
        )
        .nest("/jobs", jobs::router())
        .nest("/projects", projects::router())
        .merge(runs::router())
}
