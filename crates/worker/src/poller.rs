//! The polling loop.
//!
//! Each tick runs one runner cycle. A full batch means the queue is backed
//! up, so the loop keeps cycling without waiting for the next tick. Shutdown
//! is only observed between cycles; an in-flight cycle always finalizes its
//! jobs first.

use std::time::Duration;

use adforge_pipeline::JobRunner;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct JobPoller {
    runner: JobRunner,
    worker_id: String,
    batch_size: i64,
    interval: Duration,
}

impl JobPoller {
    pub fn new(runner: JobRunner, worker_id: String, batch_size: i64, interval: Duration) -> Self {
        Self {
            runner,
            worker_id,
            batch_size,
            interval,
        }
    }

    /// Run until `cancel` fires. Returns the number of jobs processed.
    pub async fn run(self, cancel: CancellationToken) -> usize {
        tracing::info!(
            worker_id = %self.worker_id,
            batch_size = self.batch_size,
            interval_ms = self.interval.as_millis() as u64,
            "Job poller started",
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut processed = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker_id = %self.worker_id, processed, "Job poller stopping");
                    break;
                }
                _ = interval.tick() => {
                    processed += self.drain(&cancel).await;
                }
            }
        }
        processed
    }

    /// Cycle until a batch comes back short or shutdown is requested.
    async fn drain(&self, cancel: &CancellationToken) -> usize {
        let mut processed = 0;
        loop {
            match self.runner.run_once(&self.worker_id, self.batch_size).await {
                Ok(summary) => {
                    processed += summary.claimed;
                    if summary.claimed > 0 {
                        tracing::debug!(claimed = summary.claimed, "Poll cycle finished");
                    }
                    if (summary.claimed as i64) < self.batch_size || cancel.is_cancelled() {
                        return processed;
                    }
                }
                Err(e) => {
                    tracing::error!(worker_id = %self.worker_id, error = %e, "Poll cycle failed");
                    return processed;
                }
            }
        }
    }
}
