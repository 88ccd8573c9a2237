use std::time::Duration;

use adforge_db::models::job::QueueSnapshot;
use adforge_db::repositories::JobRepo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` (a lease outlived the lease timeout) or `unavailable`.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub stale_leases: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
///
/// Reads the job queue in one query. 503 when the database does not answer
/// within [`SNAPSHOT_TIMEOUT`]; 200 with `degraded` when a running job's lease
/// is older than the configured lease timeout, which means no trigger has
/// swept it.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let query = JobRepo::queue_snapshot(&state.pool);
    let snapshot = match tokio::time::timeout(SNAPSHOT_TIMEOUT, query).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => return unavailable(format!("Queue query failed: {e}")),
        Err(_) => {
            let secs = SNAPSHOT_TIMEOUT.as_secs();
            return unavailable(format!("Queue query timed out (>{secs}s)"));
        }
    };

    let stale_leases = snapshot.has_stale_lease(state.runner.context().config.lease_timeout);
    if stale_leases {
        tracing::warn!(
            running = snapshot.running,
            oldest_lease_secs = ?snapshot.oldest_lease_secs,
            "Health check found stale leases",
        );
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: if stale_leases { "degraded" } else { "ok" },
            version: env!("CARGO_PKG_VERSION"),
            db_healthy: true,
            stale_leases,
            queue: Some(snapshot),
            error: None,
        }),
    )
}

fn unavailable(error: String) -> (StatusCode, Json<HealthResponse>) {
    tracing::error!(error = %error, "Health check failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            status: "unavailable",
            version: env!("CARGO_PKG_VERSION"),
            db_healthy: false,
            stale_leases: false,
            queue: None,
            error: Some(error),
        }),
    )
}

/// Root-level, outside `/api/v1` and without auth.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
