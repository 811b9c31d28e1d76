// crates/activity/src/recorder.rs
//! Event Recorder (C1): filters incoming domain events by category
//! policy, buffers the ones that pass, and schedules a debounced
//! aggregation job keyed by the session fingerprint.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgExecutor;

use activity_core::session::session_fingerprint;
use activity_db::{enqueue, insert_event, NewJob};
use activity_types::{NewEvent, RawEvent};

use crate::config::FeedConfig;
use crate::error::RecorderError;

pub const AGGREGATE_SESSION_JOB: &str = "aggregate_session";

/// Records one event, inside the caller's own transaction (the Recorder
/// is invoked from existing domain-write transactions, never opens its
/// own). Returns `None` if the event's category is disabled by policy —
/// nothing is persisted and no job is scheduled.
pub async fn record<'e, E>(executor: E, config: &FeedConfig, event: NewEvent, now: DateTime<Utc>) -> Result<Option<RawEvent>, RecorderError>
where
    E: PgExecutor<'e> + Copy,
{
    if !config.category_policy.is_event_kind_enabled(&event.kind) {
        tracing::debug!(kind = %event.kind, "dropping event: category disabled by policy");
        return Ok(None);
    }

    let fingerprint = session_fingerprint(event.actor_id, event.project_id, now, config.session_window_secs);
    let stored = insert_event(executor, &event, &fingerprint).await?;

    let run_at = now + Duration::seconds(config.session_window_secs);
    enqueue(
        executor,
        &NewJob {
            job_name: AGGREGATE_SESSION_JOB.to_string(),
            payload: fingerprint.clone(),
            idempotency_key: format!("{AGGREGATE_SESSION_JOB}:{fingerprint}"),
            run_at,
        },
    )
    .await?;

    Ok(Some(stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_types::{EventCategory, EventDetail};
    use uuid::Uuid;

    fn event(kind: &str) -> NewEvent {
        NewEvent {
            project_id: Uuid::nil(),
            actor_id: Uuid::nil(),
            kind: kind.to_string(),
            target_id: "el-1".to_string(),
            target_kind: "element".to_string(),
            detail: EventDetail::default(),
        }
    }

    #[test]
    fn disabled_category_is_rejected_before_any_io() {
        let config = FeedConfig::new(900, 100, [EventCategory::Folders]);
        assert!(!config.category_policy.is_event_kind_enabled("element.created"));
        let _ = event("element.created");
    }
}
