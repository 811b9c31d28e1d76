// crates/core/src/quiescence.rs
//! The freshness gate: a session is only aggregated once it has gone
//! quiet for a full window, so a burst of events doesn't get chopped up
//! into multiple activities.

use chrono::{DateTime, Utc};

/// Returns `true` once `window_secs` have elapsed since the most recent
/// event in the session (`last_event_at`). While `false`, the Session
/// Aggregator must leave the buffered rows untouched and let the delayed
/// job that triggered this check get re-scheduled by the next event.
pub fn is_quiescent(now: DateTime<Utc>, last_event_at: DateTime<Utc>, window_secs: i64) -> bool {
    (now - last_event_at).num_seconds() >= window_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn not_quiescent_within_the_window() {
        let last = Utc::now();
        let now = last + Duration::seconds(100);
        assert!(!is_quiescent(now, last, 900));
    }

    #[test]
    fn quiescent_once_the_window_has_fully_elapsed() {
        let last = Utc::now();
        let now = last + Duration::seconds(900);
        assert!(is_quiescent(now, last, 900));
    }
}
