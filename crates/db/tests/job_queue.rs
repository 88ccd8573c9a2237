//! Integration tests for the job queue: enqueue, claim, sweep and finalize.
//!
//! Runs against a real database with all migrations applied.

use std::collections::HashSet;
use std::time::Duration;

use adforge_core::job::{IngestionPayload, JobType, LEASE_EXPIRED_ERROR};
use adforge_db::models::status::JobStatus;
use adforge_db::repositories::{FailureOutcome, JobRepo};
use assert_matches::assert_matches;
use sqlx::PgPool;

const LEASE: Duration = Duration::from_secs(15 * 60);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ingestion(run_id: i64) -> IngestionPayload {
    IngestionPayload {
        ingestion_run_id: run_id,
    }
}

/// Make a backed-off job claimable now.
async fn make_available(pool: &PgPool, job_id: i64) {
    sqlx::query("UPDATE jobs SET available_at = NOW() - INTERVAL '1 second' WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Age a lease past the sweep timeout.
async fn expire_lease(pool: &PgPool, job_id: i64) {
    sqlx::query("UPDATE jobs SET locked_at = NOW() - INTERVAL '20 minutes' WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Enqueue / claim
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_creates_claimable_row(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();

    assert_eq!(job.job_type, "INGESTION");
    assert_eq!(job.status(), Some(JobStatus::Queued));
    assert_eq!(job.attempts, 0);
    assert_eq!(job.max_attempts, 3);
    assert!(job.locked_by.is_none());
    assert_eq!(job.payload, serde_json::json!({"ingestionRunId": 1}));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_leases_oldest_first(pool: PgPool) {
    let first = JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();
    let second = JobRepo::enqueue(&pool, &ingestion(2)).await.unwrap();
    let _third = JobRepo::enqueue(&pool, &ingestion(3)).await.unwrap();

    let claimed = JobRepo::claim_batch(&pool, "worker-a", 2).await.unwrap();

    assert_eq!(claimed.iter().map(|j| j.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    for job in &claimed {
        assert_eq!(job.status(), Some(JobStatus::Running));
        assert_eq!(job.attempts, 1);
        assert_eq!(job.locked_by.as_deref(), Some("worker-a"));
        assert!(job.locked_at.is_some());
        assert!(job.last_error.is_none());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_positive_batch_claims_nothing(pool: PgPool) {
    let job = JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();

    assert!(JobRepo::claim_batch(&pool, "w", 0).await.unwrap().is_empty());
    assert!(JobRepo::claim_batch(&pool, "w", -3).await.unwrap().is_empty());

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Queued));
    assert_eq!(row.attempts, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn future_and_exhausted_jobs_are_not_claimable(pool: PgPool) {
    let delayed = JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();
    sqlx::query("UPDATE jobs SET available_at = NOW() + INTERVAL '1 hour' WHERE id = $1")
        .bind(delayed.id)
        .execute(&pool)
        .await
        .unwrap();

    let exhausted = JobRepo::enqueue_with_max_attempts(&pool, &ingestion(2), 1)
        .await
        .unwrap();
    sqlx::query("UPDATE jobs SET attempts = 1 WHERE id = $1")
        .bind(exhausted.id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(JobRepo::claim_batch(&pool, "w", 10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_claims_are_disjoint(pool: PgPool) {
    for i in 0..20 {
        JobRepo::enqueue(&pool, &ingestion(i)).await.unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|w| {
            let pool = pool.clone();
            tokio::spawn(async move {
                JobRepo::claim_batch(&pool, &format!("worker-{w}"), 3)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut total = 0;
    for result in futures::future::join_all(handles).await {
        for job in result.unwrap() {
            total += 1;
            assert!(seen.insert(job.id), "job {} claimed twice", job.id);
        }
    }
    assert_eq!(total, 20);
    assert_eq!(seen.len(), 20);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attempts_check_constraint_holds(pool: PgPool) {
    let job = JobRepo::enqueue_with_max_attempts(&pool, &ingestion(1), 2)
        .await
        .unwrap();
    let err = sqlx::query("UPDATE jobs SET attempts = 3 WHERE id = $1")
        .bind(job.id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("jobs_attempts_within_max"), "{err}");
}

// ---------------------------------------------------------------------------
// Finalize
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn success_is_terminal(pool: PgPool) {
    JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();
    let job = JobRepo::claim_batch(&pool, "w", 1).await.unwrap().remove(0);

    assert!(JobRepo::mark_succeeded(&pool, job.id, "w").await.unwrap());

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Succeeded));
    assert_eq!(row.locked_by.as_deref(), Some("w"));
    assert!(row.locked_at.is_some());
    assert!(JobRepo::claim_batch(&pool, "w", 1).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_job_retries_then_exhausts(pool: PgPool) {
    JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();

    // First failure: requeued about 60s out.
    let job = JobRepo::claim_batch(&pool, "w", 1).await.unwrap().remove(0);
    assert_eq!(job.attempts, 1);
    let before = chrono::Utc::now();
    let outcome = JobRepo::mark_failed(&pool, &job, "w", "no_pages_scraped")
        .await
        .unwrap();
    assert_matches!(outcome, FailureOutcome::Retry { available_at }
        if available_at >= before + chrono::Duration::seconds(59)
            && available_at <= chrono::Utc::now() + chrono::Duration::seconds(61));

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Queued));
    assert_eq!(row.last_error.as_deref(), Some("no_pages_scraped"));
    assert!(JobRepo::claim_batch(&pool, "w", 1).await.unwrap().is_empty());

    // Second failure: backoff doubles.
    make_available(&pool, job.id).await;
    let job = JobRepo::claim_batch(&pool, "w", 1).await.unwrap().remove(0);
    assert_eq!(job.attempts, 2);
    let before = chrono::Utc::now();
    let outcome = JobRepo::mark_failed(&pool, &job, "w", "no_pages_scraped")
        .await
        .unwrap();
    assert_matches!(outcome, FailureOutcome::Retry { available_at }
        if available_at >= before + chrono::Duration::seconds(119));

    // Third failure: exhausted.
    make_available(&pool, job.id).await;
    let job = JobRepo::claim_batch(&pool, "w", 1).await.unwrap().remove(0);
    assert_eq!(job.attempts, 3);
    let outcome = JobRepo::mark_failed(&pool, &job, "w", "no_pages_scraped")
        .await
        .unwrap();
    assert_eq!(outcome, FailureOutcome::Failed);

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Failed));
    assert_eq!(row.attempts, 3);
    assert_eq!(row.last_error.as_deref(), Some("no_pages_scraped"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn finalize_without_lease_is_a_no_op(pool: PgPool) {
    JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();
    let job = JobRepo::claim_batch(&pool, "worker-a", 1).await.unwrap().remove(0);

    // Lease expires and worker B picks the job up.
    expire_lease(&pool, job.id).await;
    JobRepo::sweep_expired_leases(&pool, LEASE).await.unwrap();
    let reclaimed = JobRepo::claim_batch(&pool, "worker-b", 1).await.unwrap().remove(0);
    assert_eq!(reclaimed.attempts, 2);

    // Worker A finally returns.
    assert!(!JobRepo::mark_succeeded(&pool, job.id, "worker-a").await.unwrap());
    assert_eq!(
        JobRepo::mark_failed(&pool, &job, "worker-a", "late").await.unwrap(),
        FailureOutcome::LeaseLost
    );

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Running));
    assert_eq!(row.locked_by.as_deref(), Some("worker-b"));
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_requeues_crashed_lease_without_decrementing(pool: PgPool) {
    JobRepo::enqueue(&pool, &ingestion(1)).await.unwrap();
    let job = JobRepo::claim_batch(&pool, "worker-a", 1).await.unwrap().remove(0);
    assert_eq!(job.attempts, 1);

    // Fresh leases are untouched.
    let report = JobRepo::sweep_expired_leases(&pool, LEASE).await.unwrap();
    assert!(report.is_empty());

    expire_lease(&pool, job.id).await;
    let report = JobRepo::sweep_expired_leases(&pool, LEASE).await.unwrap();
    assert_eq!(report.requeued, 1);
    assert_eq!(report.failed, 0);

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Queued));
    assert_eq!(row.attempts, 1);
    assert!(row.locked_at.is_none());
    assert!(row.locked_by.is_none());

    let reclaimed = JobRepo::claim_batch(&pool, "worker-b", 1).await.unwrap().remove(0);
    assert_eq!(reclaimed.id, job.id);
    assert_eq!(reclaimed.attempts, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_fails_exhausted_leases(pool: PgPool) {
    JobRepo::enqueue_with_max_attempts(&pool, &ingestion(1), 1)
        .await
        .unwrap();
    let job = JobRepo::claim_batch(&pool, "w", 1).await.unwrap().remove(0);
    expire_lease(&pool, job.id).await;

    let report = JobRepo::sweep_expired_leases(&pool, LEASE).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.requeued, 0);

    let row = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(row.status(), Some(JobStatus::Failed));
    assert_eq!(row.last_error.as_deref(), Some(LEASE_EXPIRED_ERROR));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_is_idempotent(pool: PgPool) {
    for i in 0..3 {
        JobRepo::enqueue(&pool, &ingestion(i)).await.unwrap();
    }
    for job in JobRepo::claim_batch(&pool, "w", 3).await.unwrap() {
        expire_lease(&pool, job.id).await;
    }

    let first = JobRepo::sweep_expired_leases(&pool, LEASE).await.unwrap();
    assert_eq!(first.requeued, 3);

    let snapshot: Vec<(i64, i16, i32)> =
        sqlx::query_as("SELECT id, status_id, attempts FROM jobs ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    let second = JobRepo::sweep_expired_leases(&pool, LEASE).await.unwrap();
    assert!(second.is_empty());

    let after: Vec<(i64, i16, i32)> =
        sqlx::query_as("SELECT id, status_id, attempts FROM jobs ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(snapshot, after);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn count_by_payload_matches_json_fragment(pool: PgPool) {
    JobRepo::enqueue(&pool, &ingestion(7)).await.unwrap();
    JobRepo::enqueue(&pool, &ingestion(8)).await.unwrap();

    let count = JobRepo::count_by_payload(
        &pool,
        JobType::Ingestion,
        &serde_json::json!({"ingestionRunId": 7}),
    )
    .await
    .unwrap();
    assert_eq!(count, 1);
}
