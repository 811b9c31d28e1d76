// crates/monitoring/src/health.rs
//! C8: periodic health probing, snapshot persistence, and the daily
//! digest, grounded in `monitoring/adapters.py`'s `DatabaseAdapter`/
//! `QueueAdapter` and `monitoring/tasks.py`'s `check_system_health`,
//! `send_daily_report`, and `send_startup_notification`.

use std::time::Duration;

use activity_kv::KvAdapter;
use activity_notifier::Alert;
use activity_types::{AlertLevel, HealthSnapshot};
use async_trait::async_trait;
use chrono::Utc;

use crate::config::MonitoringConfig;
use crate::error::MonitoringError;
use crate::keys;
use crate::notify::Alerter;

/// A capability the health worker probes for liveness. Distinct from
/// `activity-db`/`activity-kv` so this crate never takes a direct
/// dependency on storage internals — the caller wires a thin adapter
/// over its own `Database`/`KvAdapter` handle.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    async fn ping(&self) -> Result<(), String>;
    async fn daily_stats(&self, day: chrono::NaiveDate) -> Result<DailyStats, String>;
}

#[async_trait]
pub trait QueueAdapter: Send + Sync {
    async fn ping(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStats {
    pub active_users: i64,
    pub active_projects: i64,
    pub events_recorded: i64,
    pub activities_created: i64,
}

/// Runs one probe cycle: pings every adapter under its own timeout, and
/// additionally flags the queue stuck if no job has completed within
/// `queue_stuck_threshold`.
pub async fn check_health(
    kv: &dyn KvAdapter,
    database: &dyn DatabaseAdapter,
    queue: &dyn QueueAdapter,
    config: &MonitoringConfig,
) -> Result<HealthSnapshot, MonitoringError> {
    let mut components = std::collections::BTreeMap::new();
    let mut errors = Vec::new();

    match timeout_probe(config.health_db_timeout, database.ping()).await {
        Ok(Ok(())) => {
            components.insert("database".to_string(), true);
        }
        Ok(Err(err)) => {
            components.insert("database".to_string(), false);
            errors.push(format!("database: {err}"));
        }
        Err(_) => {
            components.insert("database".to_string(), false);
            errors.push("database: health check timed out".to_string());
        }
    }

    match timeout_probe(config.health_kv_timeout, queue.ping()).await {
        Ok(Ok(())) => {
            components.insert("queue".to_string(), true);
        }
        Ok(Err(err)) => {
            components.insert("queue".to_string(), false);
            errors.push(format!("queue: {err}"));
        }
        Err(_) => {
            components.insert("queue".to_string(), false);
            errors.push("queue: health check timed out".to_string());
        }
    }

    if let Some(stuck_for) = queue_stuck_for(kv, config).await? {
        components.insert("queue".to_string(), false);
        errors.push(format!("queue: no job has completed in {}s", stuck_for.as_secs()));
    }

    let now = Utc::now();
    let snapshot = HealthSnapshot::new(components, errors, now);
    persist_snapshot(kv, &snapshot).await?;
    Ok(snapshot)
}

async fn timeout_probe<F, T>(duration: Duration, fut: F) -> Result<Result<T, String>, tokio::time::error::Elapsed>
where
    F: std::future::Future<Output = Result<T, String>>,
{
    tokio::time::timeout(duration, fut).await
}

/// Marks the queue watermark directly, for callers outside
/// `monitored_task`'s automatic update (e.g. a worker loop that wants to
/// report liveness between individual job completions).
pub async fn mark_job_completed(kv: &dyn KvAdapter) -> Result<(), MonitoringError> {
    kv.set(keys::QUEUE_LAST_JOB_COMPLETED, &Utc::now().to_rfc3339(), None).await?;
    Ok(())
}

async fn queue_stuck_for(kv: &dyn KvAdapter, config: &MonitoringConfig) -> Result<Option<Duration>, MonitoringError> {
    let Some(raw) = kv.get(keys::QUEUE_LAST_JOB_COMPLETED).await? else {
        return Ok(None);
    };
    let Ok(last_completed) = chrono::DateTime::parse_from_rfc3339(&raw) else {
        return Ok(None);
    };
    let elapsed = Utc::now().signed_duration_since(last_completed.with_timezone(&Utc));
    let elapsed = elapsed.to_std().unwrap_or_default();
    if elapsed >= config.queue_stuck_threshold {
        Ok(Some(elapsed))
    } else {
        Ok(None)
    }
}

async fn persist_snapshot(kv: &dyn KvAdapter, snapshot: &HealthSnapshot) -> Result<(), MonitoringError> {
    let payload = serde_json::to_string(snapshot).map_err(|err| MonitoringError::Serialization(err.to_string()))?;
    kv.set(keys::HEALTH_CURRENT, &payload, Some(keys::ONE_HOUR)).await?;
    kv.lpush(keys::HEALTH_HISTORY, &payload).await?;
    kv.ltrim(keys::HEALTH_HISTORY, 0, keys::HEALTH_HISTORY_MAX_LEN).await?;
    Ok(())
}

/// Sends a single digest message covering the previous day's activity
/// and current error/slow-request counts. Delivery failure itself is
/// reported at `WARNING` so a broken digest never silently disappears.
pub async fn send_daily_digest(
    kv: &dyn KvAdapter,
    alerter: &dyn Alerter,
    database: &dyn DatabaseAdapter,
    config: &MonitoringConfig,
    day: chrono::NaiveDate,
) -> Result<(), MonitoringError> {
    if !config.daily_report_enabled {
        return Ok(());
    }

    let stats = match database.daily_stats(day).await {
        Ok(stats) => stats,
        Err(err) => {
            alerter
                .alert(Alert::new(
                    "Daily digest failed",
                    format!("could not gather daily stats: {err}"),
                    AlertLevel::Warning,
                ))
                .await;
            return Ok(());
        }
    };

    let error_keys = kv.scan("monitoring:tasks:errors:*").await?;
    let total_task_errors = count_keys(kv, &error_keys).await?;
    let slow_request_keys = kv.scan("monitoring:slow_requests:dedup:*").await?;

    let alert = Alert::new(
        format!("Daily digest for {day}"),
        "Activity aggregation engine daily summary",
        AlertLevel::Info,
    )
    .with_detail("active_users", stats.active_users.to_string())
    .with_detail("active_projects", stats.active_projects.to_string())
    .with_detail("events_recorded", stats.events_recorded.to_string())
    .with_detail("activities_created", stats.activities_created.to_string())
    .with_detail("task_error_classes", total_task_errors.to_string())
    .with_detail("slow_endpoints", slow_request_keys.len().to_string());

    alerter.alert(alert).await;
    Ok(())
}

async fn count_keys(kv: &dyn KvAdapter, keys: &[String]) -> Result<usize, MonitoringError> {
    let mut count = 0;
    for key in keys {
        if kv.get(key).await?.is_some() {
            count += 1;
        }
    }
    Ok(count)
}

/// Sends a one-time startup notice in production, deduplicated within a
/// short window so process restarts under a supervisor don't spam chat.
pub async fn send_startup_notice(kv: &dyn KvAdapter, alerter: &dyn Alerter, config: &MonitoringConfig) -> Result<(), MonitoringError> {
    if !config.is_enabled() || !config.is_production() {
        return Ok(());
    }
    let acquired = kv.set_if_absent(keys::STARTUP_NOTICE_DEDUP, "1", Duration::from_secs(60)).await?;
    if acquired {
        alerter
            .alert(Alert::new(
                "Service started",
                format!("process started in {}", config.environment),
                AlertLevel::Info,
            ))
            .await;
    }
    Ok(())
}
