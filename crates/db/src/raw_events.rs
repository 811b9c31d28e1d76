// crates/db/src/raw_events.rs
//! The raw-event buffer: the Event Recorder appends rows, the Session
//! Aggregator claims and deletes them inside one transaction.

use activity_types::{EventDetail, NewEvent, RawEvent};
use sqlx::PgExecutor;

use crate::error::DbError;

/// The rows claimed for one session.
#[derive(Debug, Clone)]
pub struct ClaimedSession {
    pub events: Vec<RawEvent>,
}

impl ClaimedSession {
    pub fn last_event_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.events.iter().map(|e| e.created_at).max()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.events.iter().map(|e| e.id).collect()
    }
}

#[derive(sqlx::FromRow)]
struct RawEventRow {
    id: i64,
    session_fingerprint: String,
    project_id: uuid::Uuid,
    actor_id: uuid::Uuid,
    kind: String,
    target_id: String,
    target_kind: String,
    detail: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl RawEventRow {
    fn into_raw_event(self) -> RawEvent {
        let detail: EventDetail = serde_json::from_value(self.detail).unwrap_or_default();
        RawEvent {
            id: self.id,
            session_fingerprint: self.session_fingerprint,
            project_id: self.project_id,
            actor_id: self.actor_id,
            kind: self.kind,
            target_id: self.target_id,
            target_kind: self.target_kind,
            detail,
            created_at: self.created_at,
        }
    }
}

/// Appends one event to the buffer under the given session fingerprint.
pub async fn insert_event<'e, E>(executor: E, event: &NewEvent, session_fingerprint: &str) -> Result<RawEvent, DbError>
where
    E: PgExecutor<'e>,
{
    let detail = serde_json::to_value(&event.detail).unwrap_or_default();
    let row: RawEventRow = sqlx::query_as(
        r#"
        INSERT INTO raw_events (session_fingerprint, project_id, actor_id, kind, target_id, target_kind, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, session_fingerprint, project_id, actor_id, kind, target_id, target_kind, detail, created_at
        "#,
    )
    .bind(session_fingerprint)
    .bind(event.project_id)
    .bind(event.actor_id)
    .bind(&event.kind)
    .bind(&event.target_id)
    .bind(&event.target_kind)
    .bind(detail)
    .fetch_one(executor)
    .await?;
    Ok(row.into_raw_event())
}

/// Claims every buffered row for a session fingerprint with
/// `FOR UPDATE SKIP LOCKED`: if another aggregator worker already holds
/// the lock on these rows, this call returns an empty claim rather than
/// blocking, so two workers racing on the same session never double
/// process it.
pub async fn claim_session_events<'e, E>(executor: E, session_fingerprint: &str) -> Result<ClaimedSession, DbError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<RawEventRow> = sqlx::query_as(
        r#"
        SELECT id, session_fingerprint, project_id, actor_id, kind, target_id, target_kind, detail, created_at
        FROM raw_events
        WHERE session_fingerprint = $1
        ORDER BY created_at
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .bind(session_fingerprint)
    .fetch_all(executor)
    .await?;
    let events = rows.into_iter().map(RawEventRow::into_raw_event).collect();
    Ok(ClaimedSession { events })
}

/// Deletes the claimed rows once their session has been folded into an
/// `Activity` and a `DailyCounter`.
pub async fn delete_events<'e, E>(executor: E, ids: &[i64]) -> Result<u64, DbError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM raw_events WHERE id = ANY($1)")
        .bind(ids)
        .execute(executor)
        .await?;
    Ok(crate::rows_affected(result))
}
