// crates/monitoring/src/rate_limiter.rs
//! C5: fingerprints an error and decides whether this occurrence is
//! allowed to trigger a chat alert, grounded in `monitoring/middleware.py`'s
//! `ErrorDeduplicator` (`_generate_fingerprint` + the `SETNX`-style guard
//! in `should_alert`).

use std::time::Duration;

use activity_kv::KvAdapter;

use crate::error::MonitoringError;
use crate::keys;

/// Re-exported so callers only need to depend on this crate, not
/// `activity-core`, to compute a fingerprint.
pub use activity_core::fingerprint::error_fingerprint;

/// Decides, for a given error fingerprint, whether this occurrence may
/// fire a notification. The first caller within `window` wins; every
/// other caller within the same window is told not to alert, though
/// callers still record stats unconditionally — only alert delivery is
/// gated.
pub async fn should_alert(kv: &dyn KvAdapter, fingerprint: &str, window: Duration) -> Result<bool, MonitoringError> {
    let key = keys::rate_limit(fingerprint);
    let acquired = kv.set_if_absent(&key, "1", window).await?;
    Ok(acquired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_kv::LocalFallbackKv;

    #[tokio::test]
    async fn first_occurrence_alerts_subsequent_ones_within_window_do_not() {
        let kv = LocalFallbackKv::new();
        let fingerprint = error_fingerprint("/api/projects", "GET", "DbError", "connection refused");

        assert!(should_alert(&kv, &fingerprint, Duration::from_secs(60)).await.unwrap());
        assert!(!should_alert(&kv, &fingerprint, Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn distinct_fingerprints_alert_independently() {
        let kv = LocalFallbackKv::new();
        let a = error_fingerprint("/api/projects", "GET", "DbError", "boom");
        let b = error_fingerprint("/api/elements", "GET", "DbError", "boom");

        assert!(should_alert(&kv, &a, Duration::from_secs(60)).await.unwrap());
        assert!(should_alert(&kv, &b, Duration::from_secs(60)).await.unwrap());
    }
}
