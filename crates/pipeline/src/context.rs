use std::sync::Arc;

use adforge_llm::ModelBackend;
use sqlx::PgPool;

use crate::config::PipelineConfig;
use crate::fetcher::PageFetcher;

/// Everything a stage handler needs. Cheap to clone.
#[derive(Clone)]
pub struct PipelineContext {
    pub pool: PgPool,
    pub backend: Arc<dyn ModelBackend>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(
        pool: PgPool,
        backend: Arc<dyn ModelBackend>,
        fetcher: Arc<dyn PageFetcher>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pool,
            backend,
            fetcher,
            config,
        }
    }
}
