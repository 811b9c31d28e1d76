// crates/monitoring/src/task_instrumentation.rs
//! C7: wraps a background job's execution to record success/failure
//! stats and raise alerts on repeated or slow failures, grounded in
//! `monitoring/decorators.py`'s `monitored_task` and the stat-recording
//! half of `tasks.py`.

use std::future::Future;
use std::time::{Duration, Instant};

use activity_kv::KvAdapter;
use activity_types::AlertLevel;
use chrono::Utc;

use crate::config::MonitoringConfig;
use crate::error::MonitoringError;
use crate::keys;
use crate::notify::Alerter;

const MAX_RECORDED_TIMES: isize = 99;
const REPEATED_FAILURE_THRESHOLD: i64 = 3;

/// Tasks that themselves belong to the monitoring pipeline must not
/// advance the queue watermark: a digest or health run completing
/// should never mask an actually stuck application queue.
fn advances_queue_watermark(task_name: &str) -> bool {
    !matches!(task_name, "monitoring.daily_digest" | "monitoring.health_check" | "monitoring.batch_alerts")
}

/// Runs `task`, recording outcome stats in the KV store and, on
/// failure, rate-limiting a chat alert. The wrapped closure's own
/// `Result` is returned to the caller unchanged.
pub async fn monitored_task<F, Fut, T, E>(
    kv: &dyn KvAdapter,
    alerter: &dyn Alerter,
    config: &MonitoringConfig,
    task_name: &str,
    task: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let result = task().await;
    let elapsed = started.elapsed();

    if !config.is_enabled() {
        return result;
    }

    match &result {
        Ok(_) => {
            if let Err(err) = record_success(kv, alerter, config, task_name, elapsed).await {
                tracing::warn!(%err, task_name, "failed to record task success stats");
            }
        }
        Err(err) => {
            if let Err(record_err) = record_failure(kv, alerter, config, task_name, elapsed, &err.to_string()).await {
                tracing::warn!(err = %record_err, task_name, "failed to record task failure stats");
            }
        }
    }

    result
}

async fn record_success(
    kv: &dyn KvAdapter,
    alerter: &dyn Alerter,
    config: &MonitoringConfig,
    task_name: &str,
    elapsed: Duration,
) -> Result<(), MonitoringError> {
    kv.incr(&keys::task_success(task_name), None).await?;
    kv.lpush(&keys::task_time(task_name), &elapsed.as_secs_f64().to_string()).await?;
    kv.ltrim(&keys::task_time(task_name), 0, MAX_RECORDED_TIMES).await?;
    kv.set(&keys::task_last_success(task_name), &Utc::now().to_rfc3339(), Some(keys::ONE_HOUR)).await?;

    if advances_queue_watermark(task_name) {
        kv.set(keys::QUEUE_LAST_JOB_COMPLETED, &Utc::now().to_rfc3339(), None).await?;
    }

    if elapsed >= config.slow_task_threshold {
        alert_slow_task(kv, alerter, task_name, elapsed).await?;
    }

    Ok(())
}

/// Emits the immediate first-occurrence warning required for a slow
/// task; only the repeats within the dedup window are left for C9's
/// batch summary.
async fn alert_slow_task(kv: &dyn KvAdapter, alerter: &dyn Alerter, task_name: &str, elapsed: Duration) -> Result<(), MonitoringError> {
    let dedup_key = keys::task_slow_dedup(task_name);
    let acquired = kv.set_if_absent(&dedup_key, "1", keys::ONE_HOUR).await?;
    if acquired {
        tracing::warn!(task_name, elapsed_secs = elapsed.as_secs_f64(), "slow task detected");
        alerter
            .alert(
                activity_notifier::Alert::new(format!("Slow task: {task_name}"), format!("took {:.2}s", elapsed.as_secs_f64()), AlertLevel::Warning)
                    .with_detail("task", task_name)
                    .with_detail("elapsed_secs", format!("{:.2}", elapsed.as_secs_f64())),
            )
            .await;
    }
    Ok(())
}

async fn record_failure(
    kv: &dyn KvAdapter,
    alerter: &dyn Alerter,
    config: &MonitoringConfig,
    task_name: &str,
    elapsed: Duration,
    error_message: &str,
) -> Result<(), MonitoringError> {
    let error_class = error_message.split(':').next().unwrap_or("Unknown").trim().to_string();
    let truncated_message: String = error_message.chars().take(200).collect();

    kv.incr(&keys::task_failure(task_name), None).await?;
    kv.incr(&keys::task_error_class(&error_class), None).await?;
    let payload = serde_json::json!({
        "time": Utc::now().to_rfc3339(),
        "error": truncated_message,
        "class": error_class,
    });
    kv.set(&keys::task_last_failure(task_name), &payload.to_string(), Some(keys::ONE_DAY)).await?;
    let failure_count = kv.incr(&keys::task_failure_count(task_name), Some(keys::ONE_HOUR)).await?;

    let level = if failure_count > REPEATED_FAILURE_THRESHOLD {
        AlertLevel::Critical
    } else {
        AlertLevel::Warning
    };

    let fingerprint = crate::rate_limiter::error_fingerprint("task", task_name, &error_class, error_message);
    if crate::rate_limiter::should_alert(kv, &fingerprint, config.rate_limit_window).await? {
        alerter
            .alert(
                activity_notifier::Alert::new(format!("Task failed: {task_name}"), truncated_message.clone(), level)
                    .with_detail("task", task_name)
                    .with_detail("elapsed_secs", format!("{:.2}", elapsed.as_secs_f64()))
                    .with_detail("failure_count_last_hour", failure_count.to_string())
                    .with_error(error_class, error_message),
            )
            .await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_kv::LocalFallbackKv;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAlerter {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Alerter for RecordingAlerter {
        async fn alert(&self, alert: activity_notifier::Alert) -> bool {
            self.sent.lock().unwrap().push(alert.title.clone());
            true
        }
    }

    #[tokio::test]
    async fn successful_task_records_stats_and_advances_watermark() {
        let kv = LocalFallbackKv::new();
        let alerter = RecordingAlerter::default();
        let config = MonitoringConfig::default();

        let result: Result<(), String> = monitored_task(&kv, &alerter, &config, "import.sync", || async { Ok(()) }).await;
        assert!(result.is_ok());

        assert_eq!(kv.get(&keys::task_success("import.sync")).await.unwrap(), Some("1".to_string()));
        assert!(kv.get(keys::QUEUE_LAST_JOB_COMPLETED).await.unwrap().is_some());
        assert!(alerter.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn digest_task_success_does_not_advance_watermark() {
        let kv = LocalFallbackKv::new();
        let alerter = RecordingAlerter::default();
        let config = MonitoringConfig::default();

        let result: Result<(), String> =
            monitored_task(&kv, &alerter, &config, "monitoring.daily_digest", || async { Ok(()) }).await;
        assert!(result.is_ok());
        assert!(kv.get(keys::QUEUE_LAST_JOB_COMPLETED).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_task_records_failure_and_alerts_once_per_fingerprint() {
        let kv = LocalFallbackKv::new();
        let alerter = RecordingAlerter::default();
        let config = MonitoringConfig::default();

        for _ in 0..2 {
            let _: Result<(), String> =
                monitored_task(&kv, &alerter, &config, "import.sync", || async { Err("DbError: timeout".to_string()) }).await;
        }

        assert_eq!(kv.get(&keys::task_failure("import.sync")).await.unwrap(), Some("2".to_string()));
        assert_eq!(alerter.sent.lock().unwrap().len(), 1, "rate limiter must suppress the second identical alert");
    }
}
