//! Postgres access for the activity aggregation engine: the raw-event
//! buffer, aggregated activities, daily counters, and the delayed-job
//! queue that drives debounced session aggregation.

mod activities;
mod daily_counters;
mod error;
mod jobs;
mod raw_events;

pub use activities::{insert_activity, list_activities, ActivityFilter, ActivityRow, ActivityScope, NewActivityRow};
pub use daily_counters::{heatmap_for_project, upsert_daily_counter, HeatmapRow};
pub use error::DbError;
pub use jobs::{claim_due_jobs, complete_job, enqueue, release_job, ClaimedJob, NewJob};
pub use raw_events::{claim_session_events, delete_events, insert_event, ClaimedSession};

use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgQueryResult};
use sqlx::PgPool;

/// The embedded migrator, exposed so integration tests can spin up a
/// throwaway schema via `#[sqlx::test(migrator = "activity_db::MIGRATOR")]`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Postgres connection pool plus the query surface every component in
/// this crate operates against.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects to Postgres and runs embedded migrations. `max_connections`
    /// should be sized per-process, not per-cluster — each server process
    /// and each background worker process gets its own `Database`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Wraps an already-constructed pool (used by tests against a
    /// throwaway schema).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), DbError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

pub(crate) fn rows_affected(result: PgQueryResult) -> u64 {
    result.rows_affected()
}
