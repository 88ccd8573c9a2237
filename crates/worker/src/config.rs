use std::time::Duration;

use adforge_core::job::{DEFAULT_TRIGGER_BATCH, MAX_TRIGGER_BATCH};
use adforge_pipeline::runner::worker_identity;

/// Polling worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between cycles when the queue is not saturated.
    pub poll_interval: Duration,
    /// Jobs claimed per cycle, within `1..=10`.
    pub batch_size: i64,
    /// Lease owner recorded in `jobs.locked_by`.
    pub worker_id: String,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                  |
    /// |----------------------|--------------------------|
    /// | `POLL_INTERVAL_SECS` | `5`                      |
    /// | `WORKER_BATCH_SIZE`  | `5`                      |
    /// | `WORKER_ID`          | `worker-<uuid v7>`       |
    pub fn from_env() -> Self {
        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");
        assert!(poll_interval_secs > 0, "POLL_INTERVAL_SECS must be positive");

        let batch_size: i64 = std::env::var("WORKER_BATCH_SIZE")
            .unwrap_or_else(|_| DEFAULT_TRIGGER_BATCH.to_string())
            .parse()
            .expect("WORKER_BATCH_SIZE must be a valid i64");

        let worker_id = std::env::var("WORKER_ID")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| worker_identity("worker"));

        Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size: batch_size.clamp(1, MAX_TRIGGER_BATCH),
            worker_id,
        }
    }
}
