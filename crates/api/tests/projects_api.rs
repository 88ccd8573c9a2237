//! Integration tests for project creation and the enqueue endpoints.

mod common;

use adforge_core::job::JobType;
use adforge_db::models::project::CreateProject;
use adforge_db::repositories::{BrandRepo, JobRepo, ProjectRepo};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get_authed, post_authed, send};
use serde_json::json;
use sqlx::PgPool;

async fn seed_project(pool: &PgPool) -> i64 {
    ProjectRepo::create(
        pool,
        &CreateProject {
            name: "Acme".into(),
            primary_url: "https://acme.test".into(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Give the project an active Brand DNA, as a successful ingestion would.
async fn activate_dna(pool: &PgPool, project_id: i64) -> i64 {
    let dna = BrandRepo::create_dna(pool, project_id, &json!({"brand": {"name": "Acme"}}), "")
        .await
        .unwrap();
    ProjectRepo::set_active_brand_dna(pool, project_id, dna.id)
        .await
        .unwrap();
    dna.id
}

async fn start_generation(pool: &PgPool, project_id: i64) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_authed(
        app,
        &format!("/api/v1/projects/{project_id}/generate"),
        json!({"type": "META_ADS"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    body_json(response).await["generationRun"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_project_returns_201(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_authed(
        app,
        "/api/v1/projects",
        json!({"name": "Acme", "primaryUrl": "https://acme.test"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Acme");
    assert_eq!(json["data"]["primaryUrl"], "https://acme.test");
    assert!(json["data"]["activeBrandDnaId"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_project_validates_input(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_authed(
        app,
        "/api/v1/projects",
        json!({"name": "", "primaryUrl": "not a url"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unauthenticated_create_writes_nothing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/projects")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"name": "Acme", "primaryUrl": "https://acme.test"}).to_string(),
        ))
        .unwrap();

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_creates_run_and_job(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let app = common::build_test_app(pool.clone());

    let response = post_authed(app, &format!("/api/v1/projects/{project_id}/ingest"), json!({})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["ingestionRun"]["status"], "QUEUED");
    assert_eq!(json["ingestionRun"]["inputUrl"], "https://acme.test");
    let run_id = json["ingestionRun"]["id"].as_i64().unwrap();

    let fragment = json!({"ingestionRunId": run_id});
    assert_eq!(
        JobRepo::count_by_payload(&pool, JobType::Ingestion, &fragment).await.unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_ingest_while_active_conflicts(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let uri = format!("/api/v1/projects/{project_id}/ingest");

    let response = post_authed(common::build_test_app(pool.clone()), &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = post_authed(common::build_test_app(pool.clone()), &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "ingestion_in_progress");

    let (jobs,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE job_type = 'INGESTION'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(jobs, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_conflicts_while_previous_job_waits_to_retry(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let uri = format!("/api/v1/projects/{project_id}/ingest");

    let response = post_authed(common::build_test_app(pool.clone()), &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // First attempt failed: run FAILED, job back in the queue with backoff.
    sqlx::query("UPDATE ingestion_runs SET status_id = 4, error = 'no_pages_scraped'")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE jobs SET attempts = 1, available_at = NOW() + INTERVAL '60 seconds'")
        .execute(&pool)
        .await
        .unwrap();

    let response = post_authed(common::build_test_app(pool.clone()), &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "ingestion_in_progress");

    // Attempts exhausted: a fresh ingestion is accepted.
    sqlx::query("UPDATE jobs SET status_id = 4, attempts = max_attempts")
        .execute(&pool)
        .await
        .unwrap();
    let response = post_authed(common::build_test_app(pool.clone()), &uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_unknown_project_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_authed(app, "/api/v1/projects/999999/ingest", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_without_brand_dna_conflicts(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let app = common::build_test_app(pool.clone());

    let response = post_authed(
        app,
        &format!("/api/v1/projects/{project_id}/generate"),
        json!({"type": "META_ADS"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "brand_dna_required");

    let (runs,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM generation_runs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(runs, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_enqueues_against_active_dna(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    let dna_id = activate_dna(&pool, project_id).await;
    let app = common::build_test_app(pool.clone());

    let response = post_authed(
        app,
        &format!("/api/v1/projects/{project_id}/generate"),
        json!({"type": "SOCIAL_POSTS", "parameters": {"creativeCount": 3}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    let run = &json["generationRun"];
    assert_eq!(run["type"], "SOCIAL_POSTS");
    assert_eq!(run["status"], "QUEUED");
    assert_eq!(run["brandDnaId"], dna_id);
    assert_eq!(run["parameters"], json!({"creativeCount": 3}));

    let job = JobRepo::find_by_id(&pool, json["jobId"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.job_type, "GENERATION");
    assert_eq!(
        job.payload,
        json!({"generationRunId": run["id"], "type": "SOCIAL_POSTS"})
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_rejects_unknown_type(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    activate_dna(&pool, project_id).await;
    let app = common::build_test_app(pool);

    let response = post_authed(
        app,
        &format!("/api/v1/projects/{project_id}/generate"),
        json!({"type": "BILLBOARD"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Images and run lookups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn images_requires_at_least_one_format(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    activate_dna(&pool, project_id).await;
    let run_id = start_generation(&pool, project_id).await;

    let app = common::build_test_app(pool);
    let response = post_authed(
        app,
        &format!("/api/v1/projects/{project_id}/images"),
        json!({"generationRunId": run_id, "formats": []}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn images_for_another_projects_run_is_404(pool: PgPool) {
    let owner = seed_project(&pool).await;
    activate_dna(&pool, owner).await;
    let run_id = start_generation(&pool, owner).await;
    let other = seed_project(&pool).await;

    let app = common::build_test_app(pool.clone());
    let response = post_authed(
        app,
        &format!("/api/v1/projects/{other}/images"),
        json!({"generationRunId": run_id, "formats": ["SQUARE_1_1"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let fragment = json!({"generationRunId": run_id});
    assert_eq!(
        JobRepo::count_by_payload(&pool, JobType::Images, &fragment).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn images_enqueues_requested_formats(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    activate_dna(&pool, project_id).await;
    let run_id = start_generation(&pool, project_id).await;

    let app = common::build_test_app(pool.clone());
    let response = post_authed(
        app,
        &format!("/api/v1/projects/{project_id}/images"),
        json!({"generationRunId": run_id, "formats": ["LANDSCAPE_16_9"]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    let job = JobRepo::find_by_id(&pool, json["jobId"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        job.payload,
        json!({"generationRunId": run_id, "formats": ["LANDSCAPE_16_9"]})
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generation_lookup_includes_assets(pool: PgPool) {
    let project_id = seed_project(&pool).await;
    activate_dna(&pool, project_id).await;
    let run_id = start_generation(&pool, project_id).await;

    let app = common::build_test_app(pool);
    let response = get_authed(app, &format!("/api/v1/generations/{run_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], run_id);
    assert_eq!(json["data"]["status"], "QUEUED");
    assert!(json["data"]["output"].is_null());
    assert_eq!(json["data"]["assets"], json!([]));
}
