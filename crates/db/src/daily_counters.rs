// crates/db/src/daily_counters.rs
//! The `daily_counters` rollup table: one upsert per aggregated session,
//! summed per day for the Heatmap Reader.

use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::DbError;

/// Adds `increment` events to the `(activity_date, project_id, actor_id)`
/// counter, creating it if absent. Safe to call once per aggregated
/// session since the aggregator only calls it after successfully
/// claiming and deleting the session's raw events.
pub async fn upsert_daily_counter<'e, E>(
    executor: E,
    activity_date: NaiveDate,
    project_id: Uuid,
    actor_id: Uuid,
    increment: i64,
) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO daily_counters (activity_date, project_id, actor_id, event_count, updated_at)
        VALUES ($1, $2, $3, $4, now())
        ON CONFLICT (activity_date, project_id, actor_id)
        DO UPDATE SET event_count = daily_counters.event_count + excluded.event_count, updated_at = now()
        "#,
    )
    .bind(activity_date)
    .bind(project_id)
    .bind(actor_id)
    .bind(increment)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct HeatmapRow {
    pub date: NaiveDate,
    pub count: i64,
}

/// Sums `event_count` per day across the `[start, end]` range (inclusive),
/// optionally restricted to a single actor. Days with no rows are simply
/// absent from the result.
pub async fn heatmap_for_project<'e, E>(
    executor: E,
    project_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    actor_id: Option<Uuid>,
) -> Result<Vec<HeatmapRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<HeatmapRow> = match actor_id {
        Some(actor_id) => {
            sqlx::query_as(
                r#"
                SELECT activity_date AS date, sum(event_count)::bigint AS count
                FROM daily_counters
                WHERE project_id = $1 AND actor_id = $2 AND activity_date BETWEEN $3 AND $4
                GROUP BY activity_date
                ORDER BY activity_date
                "#,
            )
            .bind(project_id)
            .bind(actor_id)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT activity_date AS date, sum(event_count)::bigint AS count
                FROM daily_counters
                WHERE project_id = $1 AND activity_date BETWEEN $2 AND $3
                GROUP BY activity_date
                ORDER BY activity_date
                "#,
            )
            .bind(project_id)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?
        }
    };
    Ok(rows)
}
