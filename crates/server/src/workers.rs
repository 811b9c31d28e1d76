// crates/server/src/workers.rs
//! Background scheduling: the job-queue poll loop that drives debounced
//! session aggregation, and the three monitoring timers (health probe,
//! batch alert collection, daily digest), each wrapped in
//! `activity_monitoring::monitored_task` so their own stats feed the
//! pipeline they report on.

use std::sync::Arc;
use std::time::Duration;

use activity_db::{claim_due_jobs, complete_job, release_job};
use activity_feed::{aggregate, AggregateOutcome};
use activity_monitoring::{check_health, mark_job_completed, monitored_task, run_batch_cycle, send_daily_digest, DailyStats, DatabaseAdapter, QueueAdapter};
use async_trait::async_trait;
use chrono::Utc;

use crate::metrics::{record_aggregation, record_backlog};
use crate::state::AppState;

const JOB_POLL_INTERVAL: Duration = Duration::from_secs(1);
const JOB_BATCH_SIZE: i64 = 20;

/// Polls `scheduled_jobs` for due work and runs the aggregator against
/// each claim. A job's own name is `activity_feed::recorder::AGGREGATE_SESSION_JOB`
/// for every row this repository enqueues today; the match below is
/// future-proofed the way the source repository's own job dispatch is,
/// one arm per registered job kind.
pub async fn run_job_poll_loop(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(JOB_POLL_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(err) = poll_once(&state).await {
            tracing::warn!(%err, "job poll cycle failed");
        }
    }
}

/// Upcasts the shared `Notifier` to the monitoring crate's `Alerter`
/// seam; an explicit helper because `Arc<Notifier> -> Arc<dyn Alerter>`
/// unsizing only coerces implicitly, not via `as`.
fn alerter(state: &AppState) -> Arc<dyn activity_monitoring::Alerter> {
    state.notifier.clone()
}

async fn poll_once(state: &Arc<AppState>) -> Result<(), activity_db::DbError> {
    let claimed = claim_due_jobs(state.db.pool(), Utc::now(), JOB_BATCH_SIZE).await?;
    record_backlog(claimed.len() as u64);

    for job in claimed {
        match job.job_name.as_str() {
            activity_feed::recorder::AGGREGATE_SESSION_JOB => {
                let outcome: Result<AggregateOutcome, activity_feed::AggregatorError> = monitored_task(
                    &*state.kv,
                    &*alerter(state),
                    &state.monitoring_config,
                    "feed.aggregate_session",
                    || async {
                        let started = std::time::Instant::now();
                        let result = aggregate(state.db.pool(), &state.feed_config, &*state.actor_directory, &job.payload, Utc::now()).await;
                        record_aggregation(started.elapsed());
                        result
                    },
                )
                .await;

                match outcome {
                    Ok(AggregateOutcome::Deferred) => {
                        if let Err(err) = release_job(state.db.pool(), job.id).await {
                            tracing::warn!(%err, job_id = job.id, "failed to release deferred job");
                        }
                    }
                    Ok(_) => {
                        if let Err(err) = complete_job(state.db.pool(), job.id).await {
                            tracing::warn!(%err, job_id = job.id, "failed to complete job");
                        }
                        if let Err(err) = mark_job_completed(&*state.kv).await {
                            tracing::warn!(%err, "failed to mark queue watermark");
                        }
                    }
                    Err(_) => {
                        if let Err(err) = release_job(state.db.pool(), job.id).await {
                            tracing::warn!(%err, job_id = job.id, "failed to release failed job");
                        }
                    }
                }
            }
            other => {
                tracing::warn!(job_name = other, job_id = job.id, "unrecognized job kind, releasing");
                if let Err(err) = release_job(state.db.pool(), job.id).await {
                    tracing::warn!(%err, job_id = job.id, "failed to release unrecognized job");
                }
            }
        }
    }
    Ok(())
}

/// Adapts `AppState`'s own Postgres pool to the monitoring crate's
/// abstract `DatabaseAdapter`, so `activity-monitoring` never takes a
/// direct dependency on `activity-db`.
struct PoolDatabaseAdapter {
    pool: sqlx::PgPool,
}

#[async_trait]
impl DatabaseAdapter for PoolDatabaseAdapter {
    async fn ping(&self) -> Result<(), String> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ()).map_err(|err| err.to_string())
    }

    async fn daily_stats(&self, day: chrono::NaiveDate) -> Result<DailyStats, String> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                count(distinct actor_id)::bigint,
                count(distinct project_id)::bigint,
                coalesce(sum(event_count), 0)::bigint
            FROM daily_counters
            WHERE activity_date = $1
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| err.to_string())?;

        let activities_created: i64 = sqlx::query_scalar(
            r#"SELECT count(*)::bigint FROM activities WHERE started_at::date = $1"#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| err.to_string())?;

        Ok(DailyStats {
            active_users: row.0,
            active_projects: row.1,
            events_recorded: row.2,
            activities_created,
        })
    }
}

/// There is no separate queue service in this deployment — the delayed
/// job table lives in the same Postgres database — so the queue probe
/// just re-pings the pool. A deployment with a real external queue (SQS,
/// a Redis stream) would wire a distinct adapter here instead.
struct PoolQueueAdapter {
    pool: sqlx::PgPool,
}

#[async_trait]
impl QueueAdapter for PoolQueueAdapter {
    async fn ping(&self) -> Result<(), String> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ()).map_err(|err| err.to_string())
    }
}

pub async fn run_health_loop(state: Arc<AppState>) {
    let database = PoolDatabaseAdapter { pool: state.db.pool().clone() };
    let queue = PoolQueueAdapter { pool: state.db.pool().clone() };
    let mut interval = tokio::time::interval(state.monitoring_config.health_interval);
    loop {
        interval.tick().await;
        match check_health(&*state.kv, &database, &queue, &state.monitoring_config).await {
            Ok(snapshot) if !snapshot.healthy => {
                tracing::warn!(errors = ?snapshot.errors, "health check found an unhealthy component");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, "health check cycle failed"),
        }
    }
}

pub async fn run_batch_alert_loop(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(state.monitoring_config.batch_window);
    loop {
        interval.tick().await;
        if let Err(err) = run_batch_cycle(&*state.kv, &state.notifier).await {
            tracing::warn!(%err, "batch alert cycle failed");
        }
    }
}

/// Fires once a day at `daily_report_hour:daily_report_minute` local-to-
/// the-process time (the process itself is expected to run in a single
/// timezone, matching the source repository's own cron-style scheduling).
pub async fn run_daily_digest_loop(state: Arc<AppState>) {
    let database = PoolDatabaseAdapter { pool: state.db.pool().clone() };
    loop {
        let sleep_for = duration_until_next_report(&state.monitoring_config, Utc::now());
        tokio::time::sleep(sleep_for).await;
        let yesterday = (Utc::now() - chrono::Duration::days(1)).date_naive();
        if let Err(err) = send_daily_digest(&*state.kv, &*alerter(&state), &database, &state.monitoring_config, yesterday).await {
            tracing::warn!(%err, "daily digest failed to send");
        }
    }
}

fn duration_until_next_report(config: &activity_monitoring::MonitoringConfig, now: chrono::DateTime<Utc>) -> Duration {
    let today_report = now
        .date_naive()
        .and_hms_opt(config.daily_report_hour, config.daily_report_minute, 0)
        .expect("valid hour/minute")
        .and_utc();
    let next_report = if today_report > now { today_report } else { today_report + chrono::Duration::days(1) };
    (next_report - now).to_std().unwrap_or(Duration::from_secs(60))
}
