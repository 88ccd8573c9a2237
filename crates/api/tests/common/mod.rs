//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use adforge_api::config::ServerConfig;
use adforge_api::router::build_app_router;
use adforge_api::state::AppState;
use adforge_llm::{GeneratedImage, ImageRequest, JsonCompletion, JsonRequest, LlmError, ModelBackend};
use adforge_pipeline::fetcher::{FetchedPage, PageFetcher};
use adforge_pipeline::{JobRunner, PipelineConfig, PipelineContext, PipelineError};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const CRON_SECRET: &str = "test-cron-secret";
pub const OPERATOR_TOKEN: &str = "test-operator-token";

/// Backend that is never expected to be reached by API tests.
pub struct UnreachableBackend;

#[async_trait]
impl ModelBackend for UnreachableBackend {
    async fn complete_json(&self, _request: &JsonRequest) -> Result<JsonCompletion, LlmError> {
        Err(LlmError::EmptyContent)
    }

    async fn generate_image(&self, _request: &ImageRequest) -> Result<GeneratedImage, LlmError> {
        Err(LlmError::EmptyContent)
    }
}

pub struct EmptyFetcher;

#[async_trait]
impl PageFetcher for EmptyFetcher {
    async fn fetch_pages(&self, _primary_url: &str) -> Result<Vec<FetchedPage>, PipelineError> {
        Ok(Vec::new())
    }
}

/// Build a test `ServerConfig` with both secrets set.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        cron_secret: Some(CRON_SECRET.to_string()),
        operator_token: Some(OPERATOR_TOKEN.to_string()),
        scheduler_header: "x-vercel-cron".to_string(),
    }
}

/// Build the full application router, with the production middleware stack,
/// over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let runner = JobRunner::new(PipelineContext::new(
        pool.clone(),
        Arc::new(UnreachableBackend),
        Arc::new(EmptyFetcher),
        PipelineConfig::default(),
    ));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        runner,
    };
    build_app_router(state, &config)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// GET with the operator bearer token.
pub async fn get_authed(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a JSON body with the operator bearer token.
pub async fn post_authed(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
