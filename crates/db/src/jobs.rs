// crates/db/src/jobs.rs
//! The delayed-job queue backing debounced session aggregation: a
//! Postgres table using the same `FOR UPDATE SKIP LOCKED` claim pattern
//! as the raw-event buffer, with idempotency-key collapsing so repeated
//! enqueues of the same session just postpone its run time.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::error::DbError;

#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_name: String,
    pub payload: String,
    pub idempotency_key: String,
    pub run_at: DateTime<Utc>,
}

/// Inserts a job, or — if `idempotency_key` already has a pending job —
/// replaces its `run_at`. Events always push the run time later, so a
/// straight replace (not a max) is correct: the caller always computes
/// `run_at` from the latest event it just saw.
pub async fn enqueue<'e, E>(executor: E, job: &NewJob) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO scheduled_jobs (job_name, payload, idempotency_key, run_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (idempotency_key)
        DO UPDATE SET run_at = excluded.run_at, payload = excluded.payload
        "#,
    )
    .bind(&job.job_name)
    .bind(&job.payload)
    .bind(&job.idempotency_key)
    .bind(job.run_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimedJob {
    pub id: i64,
    pub job_name: String,
    pub payload: String,
}

/// Claims up to `limit` due, unlocked jobs and marks them locked in the
/// same statement (`UPDATE ... FROM (SELECT ... FOR UPDATE SKIP LOCKED)`),
/// so two workers polling concurrently never claim the same row.
pub async fn claim_due_jobs<'e, E>(executor: E, now: DateTime<Utc>, limit: i64) -> Result<Vec<ClaimedJob>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<ClaimedJob> = sqlx::query_as(
        r#"
        UPDATE scheduled_jobs
        SET locked_at = now()
        WHERE id IN (
            SELECT id FROM scheduled_jobs
            WHERE run_at <= $1 AND locked_at IS NULL
            ORDER BY run_at
            FOR UPDATE SKIP LOCKED
            LIMIT $2
        )
        RETURNING id, job_name, payload
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Removes a job once its work has completed successfully.
pub async fn complete_job<'e, E>(executor: E, id: i64) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("DELETE FROM scheduled_jobs WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

/// Unlocks a claimed job without deleting it, so it is picked up again on
/// the next poll. Used when the claimed work fails transiently.
pub async fn release_job<'e, E>(executor: E, id: i64) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE scheduled_jobs SET locked_at = NULL WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}
