// crates/db/src/activities.rs
//! Storage and paged retrieval of aggregated `Activity` rows.

use activity_types::{Activity, Summary};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::DbError;

/// An activity ready to be persisted; `id` is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewActivityRow {
    pub project_id: Uuid,
    pub actor_id: Uuid,
    pub title: String,
    pub summary: Summary,
    pub affected_folders: Vec<Uuid>,
    pub affected_elements: Vec<Uuid>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
pub struct ActivityRow {
    id: i64,
    project_id: Uuid,
    actor_id: Uuid,
    title: String,
    summary: serde_json::Value,
    affected_folders: Vec<Uuid>,
    affected_elements: Vec<Uuid>,
    started_at: chrono::DateTime<chrono::Utc>,
    ended_at: chrono::DateTime<chrono::Utc>,
}

impl ActivityRow {
    pub fn into_activity(self) -> Activity {
        let summary: Summary = serde_json::from_value(self.summary).unwrap_or(Summary { groups: Vec::new() });
        Activity {
            id: self.id,
            project_id: self.project_id,
            actor_id: self.actor_id,
            title: self.title,
            summary,
            affected_folders: self.affected_folders,
            affected_elements: self.affected_elements,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

/// Which entity a feed query scopes activities to. The project is always
/// implied; folder/element scopes additionally require an overlap or
/// containment match against the activity's affected-entity arrays.
#[derive(Debug, Clone)]
pub enum ActivityScope {
    Project,
    Folder { folder_ids: Vec<Uuid> },
    Element { element_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct ActivityFilter {
    pub project_id: Uuid,
    pub scope: ActivityScope,
    pub page: u32,
    pub size: u32,
}

impl ActivityFilter {
    fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.size as i64
    }
}

pub async fn insert_activity<'e, E>(executor: E, activity: &NewActivityRow) -> Result<i64, DbError>
where
    E: PgExecutor<'e>,
{
    let summary = serde_json::to_value(&activity.summary).unwrap_or(serde_json::json!({ "groups": [] }));
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO activities (project_id, actor_id, title, summary, affected_folders, affected_elements, started_at, ended_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(activity.project_id)
    .bind(activity.actor_id)
    .bind(&activity.title)
    .bind(summary)
    .bind(&activity.affected_folders)
    .bind(&activity.affected_elements)
    .bind(activity.started_at)
    .bind(activity.ended_at)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// Returns `(page_of_activities, total_matching_rows)`.
pub async fn list_activities<'e, E>(executor: E, filter: &ActivityFilter) -> Result<(Vec<Activity>, i64), DbError>
where
    E: PgExecutor<'e> + Copy,
{
    let total = count_activities(executor, filter).await?;
    let rows: Vec<ActivityRow> = match &filter.scope {
        ActivityScope::Project => {
            sqlx::query_as(
                r#"
                SELECT id, project_id, actor_id, title, summary, affected_folders, affected_elements, started_at, ended_at
                FROM activities
                WHERE project_id = $1
                ORDER BY ended_at DESC, id DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(filter.project_id)
            .bind(filter.size as i64)
            .bind(filter.offset())
            .fetch_all(executor)
            .await?
        }
        ActivityScope::Folder { folder_ids } => {
            sqlx::query_as(
                r#"
                SELECT id, project_id, actor_id, title, summary, affected_folders, affected_elements, started_at, ended_at
                FROM activities
                WHERE project_id = $1 AND affected_folders && $2
                ORDER BY ended_at DESC, id DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(filter.project_id)
            .bind(folder_ids)
            .bind(filter.size as i64)
            .bind(filter.offset())
            .fetch_all(executor)
            .await?
        }
        ActivityScope::Element { element_id } => {
            sqlx::query_as(
                r#"
                SELECT id, project_id, actor_id, title, summary, affected_folders, affected_elements, started_at, ended_at
                FROM activities
                WHERE project_id = $1 AND affected_elements @> ARRAY[$2]::uuid[]
                ORDER BY ended_at DESC, id DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(filter.project_id)
            .bind(element_id)
            .bind(filter.size as i64)
            .bind(filter.offset())
            .fetch_all(executor)
            .await?
        }
    };
    Ok((rows.into_iter().map(ActivityRow::into_activity).collect(), total))
}

async fn count_activities<'e, E>(executor: E, filter: &ActivityFilter) -> Result<i64, DbError>
where
    E: PgExecutor<'e>,
{
    let (count,): (i64,) = match &filter.scope {
        ActivityScope::Project => {
            sqlx::query_as("SELECT count(*) FROM activities WHERE project_id = $1")
                .bind(filter.project_id)
                .fetch_one(executor)
                .await?
        }
        ActivityScope::Folder { folder_ids } => {
            sqlx::query_as("SELECT count(*) FROM activities WHERE project_id = $1 AND affected_folders && $2")
                .bind(filter.project_id)
                .bind(folder_ids)
                .fetch_one(executor)
                .await?
        }
        ActivityScope::Element { element_id } => {
            sqlx::query_as(
                "SELECT count(*) FROM activities WHERE project_id = $1 AND affected_elements @> ARRAY[$2]::uuid[]",
            )
            .bind(filter.project_id)
            .bind(element_id)
            .fetch_one(executor)
            .await?
        }
    };
    Ok(count)
}
