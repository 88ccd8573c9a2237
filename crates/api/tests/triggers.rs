//! Integration tests for the scheduler and operator triggers.

mod common;

use adforge_core::job::JobType;
use adforge_db::models::status::JobStatus;
use adforge_db::repositories::JobRepo;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, send, CRON_SECRET, OPERATOR_TOKEN};
use serde_json::json;
use sqlx::PgPool;

/// Enqueue IMAGES jobs whose payload cannot decode, so processing fails fast
/// without touching the model backend.
async fn enqueue_broken_jobs(pool: &PgPool, n: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let job = JobRepo::enqueue_raw(pool, JobType::Images, &json!({}), 3)
            .await
            .unwrap();
        ids.push(job.id);
    }
    ids
}

fn cron_request(method: Method, header: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/api/v1/cron/process-jobs");
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn process_request(query: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/jobs/process{query}"));
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

// ---------------------------------------------------------------------------
// Scheduler trigger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_without_credentials_is_rejected_without_side_effects(pool: PgPool) {
    let ids = enqueue_broken_jobs(&pool, 1).await;
    let app = common::build_test_app(pool.clone());

    let response = send(app, cron_request(Method::POST, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let job = JobRepo::find_by_id(&pool, ids[0]).await.unwrap().unwrap();
    assert_eq!(job.status(), Some(JobStatus::Queued));
    assert_eq!(job.attempts, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_with_wrong_secret_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(
        app,
        cron_request(Method::POST, Some(("authorization", "Bearer wrong"))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_processes_a_single_job(pool: PgPool) {
    let ids = enqueue_broken_jobs(&pool, 3).await;
    let app = common::build_test_app(pool.clone());
    let bearer = format!("Bearer {CRON_SECRET}");

    let response = send(
        app,
        cron_request(Method::POST, Some(("authorization", bearer.as_str()))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["claimed"], 1);
    assert_eq!(json["results"][0]["id"], ids[0]);
    assert_eq!(json["results"][0]["type"], "IMAGES");
    assert_eq!(json["results"][0]["status"], "RETRY");

    let untouched = JobRepo::find_by_id(&pool, ids[1]).await.unwrap().unwrap();
    assert_eq!(untouched.attempts, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_accepts_scheduler_header_and_legacy_secret(pool: PgPool) {
    enqueue_broken_jobs(&pool, 2).await;

    let app = common::build_test_app(pool.clone());
    let response = send(app, cron_request(Method::GET, Some(("x-vercel-cron", "1")))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["claimed"], 1);

    let app = common::build_test_app(pool);
    let response = send(
        app,
        cron_request(Method::POST, Some(("x-cron-secret", CRON_SECRET))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["claimed"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_on_empty_queue_claims_nothing(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(app, cron_request(Method::GET, Some(("x-vercel-cron", "1")))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["claimed"], 0);
    assert_eq!(json["results"], json!([]));
}

// ---------------------------------------------------------------------------
// Operator trigger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_requires_operator_token(pool: PgPool) {
    enqueue_broken_jobs(&pool, 1).await;

    let app = common::build_test_app(pool.clone());
    let response = send(app, process_request("", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The cron secret is not an operator credential.
    let app = common::build_test_app(pool);
    let response = send(app, process_request("", Some(CRON_SECRET))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_defaults_to_five_for_junk_values(pool: PgPool) {
    enqueue_broken_jobs(&pool, 7).await;
    let app = common::build_test_app(pool);

    let response = send(app, process_request("?maxJobs=lots", Some(OPERATOR_TOKEN))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["claimed"], 5);
    assert_eq!(json["results"].as_array().unwrap().len(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_clamps_max_jobs(pool: PgPool) {
    enqueue_broken_jobs(&pool, 12).await;

    let app = common::build_test_app(pool.clone());
    let response = send(app, process_request("?maxJobs=50", Some(OPERATOR_TOKEN))).await;
    assert_eq!(body_json(response).await["claimed"], 10);

    let app = common::build_test_app(pool);
    let response = send(app, process_request("?maxJobs=0", Some(OPERATOR_TOKEN))).await;
    assert_eq!(body_json(response).await["claimed"], 1);
}
