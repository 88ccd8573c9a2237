use adforge_core::creative::SchemaViolation;
use adforge_core::error::CoreError;
use adforge_core::job::JobType;
use adforge_llm::LlmError;

/// Stage-level failure identifiers. Stored verbatim in run and job errors.
pub const INGESTION_RUN_NOT_FOUND: &str = "ingestion_run_not_found";
pub const GENERATION_RUN_NOT_FOUND: &str = "generation_run_not_found";
pub const BRAND_DNA_NOT_FOUND: &str = "brand_dna_not_found";
pub const NO_PAGES_SCRAPED: &str = "no_pages_scraped";

/// Errors raised by stage handlers and the runner.
///
/// The `Display` text is what ends up in `jobs.last_error` and the run's
/// `error` column.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Model(#[from] LlmError),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid {job_type} payload: {source}")]
    Payload {
        job_type: JobType,
        source: serde_json::Error,
    },

    /// A domain failure identified by a short message, e.g. `no_pages_scraped`.
    #[error("{0}")]
    Failed(String),
}

impl PipelineError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
