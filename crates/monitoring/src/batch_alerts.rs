// crates/monitoring/src/batch_alerts.rs
//! C9: the Batched Alert Collector, grounded in `monitoring/batch_alerts.py`.
//! Runs on its own cadence (`MonitoringConfig::batch_window`), draining the
//! slow-request list the interceptor accumulates and summarizing failed/
//! slow tasks, into a single muted chat message instead of one alert per
//! occurrence.

use std::collections::HashMap;

use activity_kv::KvAdapter;
use activity_notifier::Notifier;

use crate::error::MonitoringError;
use crate::keys;

const TOP_SAMPLE_ENDPOINTS: usize = 5;
const TOP_SAMPLE_REQUESTS: usize = 3;
const TOP_FAILING_TASKS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
struct EndpointBatch {
    path: String,
    count: usize,
    max_secs: f64,
    mean_secs: f64,
    samples: Vec<String>,
}

/// Drains the accumulated slow-request batch and task failure/slowness
/// markers, and sends one summary message. Sends nothing when there is
/// nothing to report.
pub async fn run_batch_cycle(kv: &dyn KvAdapter, notifier: &Notifier) -> Result<(), MonitoringError> {
    let slow_requests = drain_slow_requests(kv).await?;
    let failed_tasks = top_keys(kv, "monitoring:tasks:failure:*", TOP_FAILING_TASKS).await?;
    let slow_tasks = top_keys(kv, "monitoring:tasks:slow:*", TOP_FAILING_TASKS).await?;

    if slow_requests.is_empty() && failed_tasks.is_empty() && slow_tasks.is_empty() {
        return Ok(());
    }

    let text = render_summary(&slow_requests, &failed_tasks, &slow_tasks);
    notifier.send_message(&text, true).await;
    Ok(())
}

async fn drain_slow_requests(kv: &dyn KvAdapter) -> Result<Vec<EndpointBatch>, MonitoringError> {
    let key = keys::slow_request_batch();
    let raw_entries = kv.lrange(&key, 0, -1).await?;
    kv.delete(&key).await?;

    let mut by_path: HashMap<String, Vec<(f64, String)>> = HashMap::new();
    for raw in raw_entries {
        let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        let path = parsed.get("path").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
        let method = parsed.get("method").and_then(|v| v.as_str()).unwrap_or("?").to_string();
        let elapsed = parsed.get("elapsed_secs").and_then(|v| v.as_f64()).unwrap_or(0.0);
        by_path.entry(path).or_default().push((elapsed, method));
    }

    let mut batches: Vec<EndpointBatch> = by_path
        .into_iter()
        .map(|(path, entries)| {
            let count = entries.len();
            let max_secs = entries.iter().map(|(secs, _)| *secs).fold(0.0_f64, f64::max);
            let mean_secs = entries.iter().map(|(secs, _)| *secs).sum::<f64>() / count.max(1) as f64;
            let samples = entries
                .iter()
                .take(TOP_SAMPLE_REQUESTS)
                .map(|(secs, method)| format!("{method} {secs:.2}s"))
                .collect();
            EndpointBatch {
                path,
                count,
                max_secs,
                mean_secs,
                samples,
            }
        })
        .collect();

    batches.sort_by(|a, b| b.count.cmp(&a.count));
    batches.truncate(TOP_SAMPLE_ENDPOINTS);
    Ok(batches)
}

async fn top_keys(kv: &dyn KvAdapter, pattern: &str, limit: usize) -> Result<Vec<String>, MonitoringError> {
    let mut keys = kv.scan(pattern).await?;
    keys.sort();
    keys.truncate(limit);
    Ok(keys
        .into_iter()
        .map(|key| key.rsplit(':').next().unwrap_or(&key).to_string())
        .collect())
}

fn render_summary(slow_requests: &[EndpointBatch], failed_tasks: &[String], slow_tasks: &[String]) -> String {
    let mut lines = vec!["Monitoring batch summary".to_string(), String::new()];

    if !slow_requests.is_empty() {
        lines.push("Slow endpoints:".to_string());
        for batch in slow_requests {
            lines.push(format!(
                "- {} x{} max={:.2}s mean={:.2}s samples=[{}]",
                batch.path,
                batch.count,
                batch.max_secs,
                batch.mean_secs,
                batch.samples.join(", ")
            ));
        }
        lines.push(String::new());
    }

    if !failed_tasks.is_empty() {
        lines.push(format!("Failing tasks: {}", failed_tasks.join(", ")));
    }
    if !slow_tasks.is_empty() {
        lines.push(format!("Slow tasks: {}", slow_tasks.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_kv::LocalFallbackKv;

    #[tokio::test]
    async fn empty_state_sends_nothing() {
        let kv = LocalFallbackKv::new();
        let notifier = Notifier::Disabled;
        // Disabled notifier would return false even if called; this
        // proves the function short-circuits before attempting to send.
        run_batch_cycle(&kv, &notifier).await.unwrap();
        assert!(kv.lrange(&keys::slow_request_batch(), 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn drain_groups_by_endpoint_and_clears_the_batch() {
        let kv = LocalFallbackKv::new();
        for _ in 0..3 {
            kv.lpush(
                &keys::slow_request_batch(),
                &serde_json::json!({"path": "/feed/project/1", "method": "GET", "elapsed_secs": 4.0}).to_string(),
            )
            .await
            .unwrap();
        }

        let batches = drain_slow_requests(&kv).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].count, 3);
        assert!(kv.lrange(&keys::slow_request_batch(), 0, -1).await.unwrap().is_empty());
    }
}
