// crates/core/src/session.rs
//! Session fingerprinting: the stable key that buckets events from the
//! same actor/project into the same aggregation window.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Computes `SF = H(actor_id, project_id, floor(now_epoch / window_secs))`.
///
/// The same actor and project emitting events within the same
/// `window_secs`-wide bucket always produce the same fingerprint, which is
/// what lets the Recorder both partition the raw-event buffer and collapse
/// repeated delayed-aggregation jobs onto a single idempotency key.
pub fn session_fingerprint(actor_id: Uuid, project_id: Uuid, now: DateTime<Utc>, window_secs: i64) -> String {
    let window_secs = window_secs.max(1);
    let bucket = now.timestamp().div_euclid(window_secs);
    let mut hasher = Sha256::new();
    hasher.update(actor_id.as_bytes());
    hasher.update(project_id.as_bytes());
    hasher.update(bucket.to_be_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn same_bucket_is_stable() {
        let actor = Uuid::nil();
        let project = Uuid::from_u128(1);
        let t1 = Utc.timestamp_opt(1_000_000, 0).unwrap();
        let t2 = Utc.timestamp_opt(1_000_400, 0).unwrap();
        assert_eq!(
            session_fingerprint(actor, project, t1, 900),
            session_fingerprint(actor, project, t2, 900)
        );
    }

    #[test]
    fn crossing_a_window_boundary_changes_the_fingerprint() {
        let actor = Uuid::nil();
        let project = Uuid::from_u128(1);
        let t1 = Utc.timestamp_opt(1_000_000, 0).unwrap();
        let t2 = Utc.timestamp_opt(1_000_000 + 900, 0).unwrap();
        assert_ne!(
            session_fingerprint(actor, project, t1, 900),
            session_fingerprint(actor, project, t2, 900)
        );
    }

    #[test]
    fn different_actor_or_project_changes_the_fingerprint() {
        let now = Utc::now();
        let a = session_fingerprint(Uuid::from_u128(1), Uuid::from_u128(2), now, 900);
        let b = session_fingerprint(Uuid::from_u128(2), Uuid::from_u128(2), now, 900);
        let c = session_fingerprint(Uuid::from_u128(1), Uuid::from_u128(3), now, 900);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
