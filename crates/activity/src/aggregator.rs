// crates/activity/src/aggregator.rs
//! Session Aggregator (C2): folds a session's buffered events into one
//! titled `Activity`, updates the day's counters, and clears the buffer.
//! Invoked by the scheduler against the session fingerprint it claimed
//! from a due `aggregate_session` job.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use activity_core::extract::{extract_affected_entities, AffectedEntities};
use activity_core::quiescence::is_quiescent;
use activity_core::summary::build_summary;
use activity_core::title::generate_title;
use activity_db::{claim_session_events, delete_events, insert_activity, upsert_daily_counter, NewActivityRow};
use activity_types::RawEvent;

use crate::collaborators::ActorDirectory;
use crate::config::FeedConfig;
use crate::error::AggregatorError;

/// What happened when `aggregate` ran: whether it produced an activity,
/// found nothing to claim, or deferred because the session is still
/// active. Callers (the job worker) use this to decide whether to
/// complete or release the triggering job; a `Deferred` outcome means the
/// job should be released, since a later event will re-enqueue it with a
/// fresh `run_at`.
#[derive(Debug)]
pub enum AggregateOutcome {
    Aggregated { activity_id: i64, event_count: usize },
    EmptyClaim,
    Deferred,
}

/// Runs one aggregation pass for `session_fingerprint` against an
/// existing transaction. The caller commits or rolls back; all of steps
/// 1–7 in the aggregation flow happen atomically or not at all.
pub async fn aggregate<'e, E>(
    executor: E,
    config: &FeedConfig,
    actor_directory: &dyn ActorDirectory,
    session_fingerprint: &str,
    now: DateTime<Utc>,
) -> Result<AggregateOutcome, AggregatorError>
where
    E: PgExecutor<'e> + Copy,
{
    let claimed = claim_session_events(executor, session_fingerprint).await?;
    if claimed.events.is_empty() {
        return Ok(AggregateOutcome::EmptyClaim);
    }

    let last_event_at = claimed.last_event_at().expect("non-empty claim has a last event");
    if !is_quiescent(now, last_event_at, config.session_window_secs) {
        // The job's own delay is advisory; this freshness check is the
        // authoritative gate. Leave the buffer untouched — the next
        // event in this session re-enqueues the job further out.
        return Ok(AggregateOutcome::Deferred);
    }

    let events = &claimed.events;
    let started_at = events.iter().map(|e| e.created_at).min().expect("non-empty claim has a first event");
    let project_id = events[0].project_id;
    let actor_id = events[0].actor_id;

    let affected = collect_affected_entities(events);
    let summary = build_summary(events);
    let actor_name = actor_directory
        .display_name(actor_id)
        .await
        .unwrap_or_else(|_| "Пользователь".to_string());
    let title = generate_title(&actor_name, events);

    let activity_id = insert_activity(
        executor,
        &NewActivityRow {
            project_id,
            actor_id,
            title,
            summary,
            affected_folders: dedup(affected.folders),
            affected_elements: dedup(affected.elements),
            started_at,
            ended_at: last_event_at,
        },
    )
    .await?;

    upsert_daily_counter(executor, last_event_at.date_naive(), project_id, actor_id, events.len() as i64).await?;

    delete_events(executor, &claimed.ids()).await?;

    Ok(AggregateOutcome::Aggregated {
        activity_id,
        event_count: events.len(),
    })
}

fn collect_affected_entities(events: &[RawEvent]) -> AffectedEntities {
    let mut all = AffectedEntities::default();
    for event in events {
        let entities = extract_affected_entities(event);
        all.folders.extend(entities.folders);
        all.elements.extend(entities.elements);
    }
    all
}

fn dedup(mut ids: Vec<uuid::Uuid>) -> Vec<uuid::Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_core::extract::extract_affected_entities as _extract;
    use activity_types::EventDetail;
    use uuid::Uuid;

    fn event(id: i64, kind: &str, created_at: DateTime<Utc>) -> RawEvent {
        RawEvent {
            id,
            session_fingerprint: "sf".into(),
            project_id: Uuid::nil(),
            actor_id: Uuid::nil(),
            kind: kind.into(),
            target_id: "el-1".into(),
            target_kind: "element".into(),
            detail: EventDetail::default(),
            created_at,
        }
    }

    #[test]
    fn dedup_collapses_duplicate_entity_ids() {
        let id = Uuid::new_v4();
        assert_eq!(dedup(vec![id, id, id]), vec![id]);
    }

    #[test]
    fn collect_affected_entities_matches_per_event_extraction() {
        let now = Utc::now();
        let events = vec![event(1, "element.created", now), event(2, "element.updated", now)];
        let combined = collect_affected_entities(&events);
        let mut expected = AffectedEntities::default();
        for event in &events {
            let e = _extract(event);
            expected.elements.extend(e.elements);
            expected.folders.extend(e.folders);
        }
        assert_eq!(combined, expected);
    }
}
