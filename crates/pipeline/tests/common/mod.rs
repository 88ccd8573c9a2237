//! Shared fixtures for pipeline integration tests: scripted fakes for the
//! model backend and page fetcher, plus seed helpers.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adforge_core::creative::CreativeType;
use adforge_db::models::generation_run::{CreateGenerationRun, GenerationRun};
use adforge_db::models::project::CreateProject;
use adforge_db::repositories::{BrandRepo, ProjectRepo};
use adforge_llm::{GeneratedImage, ImageRequest, JsonCompletion, JsonRequest, LlmError, ModelBackend};
use adforge_db::models::ingestion_run::IngestionRun;
use adforge_db::models::job::Job;
use adforge_pipeline::enqueue::{start_generation, start_ingestion, IngestionStart};
use adforge_pipeline::fetcher::{FetchedPage, PageFetcher};
use adforge_pipeline::{JobRunner, PipelineConfig, PipelineContext, PipelineError};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Model backend answering text calls from a script, in order.
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<String>>,
    failing_sizes: Mutex<HashSet<String>>,
    pub requests: Mutex<Vec<JsonRequest>>,
    pub json_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_reply(&self, content: impl Into<String>) {
        self.replies.lock().unwrap().push_back(content.into());
    }

    pub fn push_json(&self, value: Value) {
        self.push_reply(value.to_string());
    }

    /// Make image calls for `size` (e.g. `1024x1536`) fail.
    pub fn fail_image_size(&self, size: &str) {
        self.failing_sizes.lock().unwrap().insert(size.to_string());
    }

    pub fn json_calls(&self) -> usize {
        self.json_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for FakeBackend {
    async fn complete_json(&self, request: &JsonRequest) -> Result<JsonCompletion, LlmError> {
        self.json_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)?;
        Ok(JsonCompletion {
            content,
            model: "fake-text".to_string(),
            usage: Some(json!({"total_tokens": 42})),
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, LlmError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_sizes.lock().unwrap().contains(&request.size) {
            return Err(LlmError::Api {
                status: 500,
                body: "render failed".to_string(),
            });
        }
        Ok(GeneratedImage {
            model: "fake-image".to_string(),
            result_url: Some(format!("https://img.test/{}.png", request.size)),
        })
    }
}

/// Page fetcher returning a fixed page set.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Vec<FetchedPage>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_pages(pages: Vec<FetchedPage>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_pages(&self, _primary_url: &str) -> Result<Vec<FetchedPage>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.clone())
    }
}

pub fn page(url: &str, content: &str) -> FetchedPage {
    FetchedPage {
        url: url.to_string(),
        title: Some("Acme".to_string()),
        content: content.to_string(),
    }
}

pub fn runner(pool: &PgPool, backend: Arc<FakeBackend>, fetcher: Arc<FakeFetcher>) -> JobRunner {
    JobRunner::new(PipelineContext::new(
        pool.clone(),
        backend,
        fetcher,
        PipelineConfig::default(),
    ))
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_project(pool: &PgPool) -> i64 {
    ProjectRepo::create(
        pool,
        &CreateProject {
            name: "Acme".to_string(),
            primary_url: "https://acme.test".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Start an ingestion that is expected to be accepted.
pub async fn ingest(pool: &PgPool, project_id: i64) -> (IngestionRun, Job) {
    match start_ingestion(pool, project_id, "https://acme.test/", 3).await.unwrap() {
        IngestionStart::Started { run, job } => (run, job),
        IngestionStart::InFlight { run_id } => panic!("ingestion {run_id} unexpectedly in flight"),
    }
}

/// Project with an active Brand DNA and a queued generation run + job.
pub async fn seed_generation(pool: &PgPool, creative_type: CreativeType) -> GenerationRun {
    let project_id = seed_project(pool).await;
    let dna = BrandRepo::create_dna(
        pool,
        project_id,
        &json!({"brand": {"name": "Acme", "valueProp": "Invoices in minutes"}}),
        "corpus",
    )
    .await
    .unwrap();
    ProjectRepo::set_active_brand_dna(pool, project_id, dna.id)
        .await
        .unwrap();

    let (run, _job) = start_generation(
        pool,
        &CreateGenerationRun {
            project_id,
            brand_dna_id: dna.id,
            creative_type: creative_type.as_str().to_string(),
            parameters: json!({}),
        },
        creative_type,
        3,
    )
    .await
    .unwrap();
    run
}

pub fn meta_ad(angle: &str) -> Value {
    json!({
        "angle": angle,
        "audienceSegment": "Finance teams",
        "primaryText": "Stop chasing invoices.",
        "headline": "Get paid faster",
        "description": "Automated reminders.",
        "cta": "Start free"
    })
}

pub fn meta_ads(n: usize) -> Value {
    json!({
        "type": "META_ADS",
        "ads": (0..n).map(|i| meta_ad(&format!("angle {i}"))).collect::<Vec<_>>(),
    })
}

/// Make every queued job claimable now, skipping backoff.
pub async fn skip_backoff(pool: &PgPool) {
    sqlx::query("UPDATE jobs SET available_at = NOW() - INTERVAL '1 second' WHERE status_id = 1")
        .execute(pool)
        .await
        .unwrap();
}
