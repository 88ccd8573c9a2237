use std::sync::Arc;
use std::time::Duration;

use adforge_llm::{LlmConfig, OpenAiClient};
use adforge_pipeline::fetcher::HttpPageFetcher;
use adforge_pipeline::{JobRunner, PipelineConfig, PipelineContext};
use adforge_worker::config::WorkerConfig;
use adforge_worker::poller::JobPoller;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on waiting for the in-flight cycle after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adforge_worker=debug,adforge_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let worker_config = WorkerConfig::from_env();
    let pipeline_config = PipelineConfig::from_env();
    let llm_config = LlmConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = adforge_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    adforge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Pipeline ---
    let backend = OpenAiClient::new(llm_config).expect("Failed to build model backend");
    let fetcher = HttpPageFetcher::new().expect("Failed to build page fetcher");
    let runner = JobRunner::new(PipelineContext::new(
        pool,
        Arc::new(backend),
        Arc::new(fetcher),
        pipeline_config,
    ));

    let poller = JobPoller::new(
        runner,
        worker_config.worker_id,
        worker_config.batch_size,
        worker_config.poll_interval,
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));

    shutdown_signal().await;
    cancel.cancel();

    match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
        Ok(Ok(processed)) => tracing::info!(processed, "Worker stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Poller task panicked"),
        Err(_) => tracing::warn!("In-flight cycle did not finish in time; its leases will expire"),
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
