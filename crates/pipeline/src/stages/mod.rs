//! Stage handlers, one per job type.
//!
//! Each handler owns its run row while it executes. On failure it marks the
//! run `FAILED` (best effort) and returns the error for the runner to
//! finalize the job with.

pub mod generation;
pub mod images;
pub mod ingestion;

/// Log-and-ignore wrapper for the best-effort run failure write.
async fn record_run_failure<F>(kind: &'static str, run_id: i64, write: F)
where
    F: std::future::Future<Output = Result<bool, sqlx::Error>>,
{
    if let Err(e) = write.await {
        tracing::warn!(run_kind = kind, run_id, error = %e, "Failed to mark run as failed");
    }
}
