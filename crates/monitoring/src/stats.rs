// crates/monitoring/src/stats.rs
//! Per-day error statistics broken down by type, endpoint, and status
//! code, grounded in `monitoring/middleware.py`'s
//! `ErrorDeduplicator.record_error`. Kept as a query helper for
//! operational debugging; the daily digest intentionally only reads the
//! coarser `tasks:errors:*` counters to stay within the chat message
//! length budget (see `health::send_daily_digest`).

use activity_kv::KvAdapter;
use chrono::NaiveDate;

use crate::error::MonitoringError;

fn namespace(day: NaiveDate) -> String {
    format!("monitoring:stats:{day}")
}

pub async fn record_error(kv: &dyn KvAdapter, day: NaiveDate, error_type: &str, endpoint: &str, status: u16) -> Result<(), MonitoringError> {
    let ns = namespace(day);
    kv.incr(&format!("{ns}:errors:total"), Some(crate::keys::ONE_DAY)).await?;
    kv.incr(&format!("{ns}:errors:type:{error_type}"), Some(crate::keys::ONE_DAY)).await?;
    kv.incr(&format!("{ns}:errors:endpoint:{endpoint}"), Some(crate::keys::ONE_DAY)).await?;
    kv.incr(&format!("{ns}:errors:status:{status}"), Some(crate::keys::ONE_DAY)).await?;
    Ok(())
}

/// Total error count recorded for a given day, or 0 if none were
/// recorded (not merely absent from the KV store).
pub async fn total_errors(kv: &dyn KvAdapter, day: NaiveDate) -> Result<i64, MonitoringError> {
    let key = format!("{}:errors:total", namespace(day));
    Ok(kv.get(&key).await?.and_then(|raw| raw.parse().ok()).unwrap_or(0))
}

/// Breakdown of error counts by type for a given day, read via `SCAN`.
pub async fn errors_by_type(kv: &dyn KvAdapter, day: NaiveDate) -> Result<Vec<(String, i64)>, MonitoringError> {
    let pattern = format!("{}:errors:type:*", namespace(day));
    let keys = kv.scan(&pattern).await?;
    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        let count = kv.get(&key).await?.and_then(|raw| raw.parse().ok()).unwrap_or(0);
        let error_type = key.rsplit(':').next().unwrap_or(&key).to_string();
        out.push((error_type, count));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_kv::LocalFallbackKv;

    #[tokio::test]
    async fn recording_increments_every_dimension() {
        let kv = LocalFallbackKv::new();
        let day = chrono::Utc::now().date_naive();
        record_error(&kv, day, "DbError", "/feed/project/1", 503).await.unwrap();
        record_error(&kv, day, "DbError", "/feed/project/1", 503).await.unwrap();

        assert_eq!(total_errors(&kv, day).await.unwrap(), 2);
        let by_type = errors_by_type(&kv, day).await.unwrap();
        assert_eq!(by_type, vec![("DbError".to_string(), 2)]);
    }
}
