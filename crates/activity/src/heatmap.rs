// crates/activity/src/heatmap.rs
//! Heatmap Reader (C4): a dense-enough daily activity count series for a
//! project's date range, optionally scoped to one actor.

use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use activity_db::heatmap_for_project;
use activity_types::{ActivityHeatmapItem, ActivityHeatmapResponse};

use crate::error::FeedError;

const MAX_RANGE_DAYS: i64 = 366;

pub async fn get_heatmap<'e, E>(
    executor: E,
    project_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    actor_id: Option<Uuid>,
) -> Result<ActivityHeatmapResponse, FeedError>
where
    E: PgExecutor<'e>,
{
    let width = (end - start).num_days();
    if width < 0 || width > MAX_RANGE_DAYS {
        return Err(FeedError::InvalidArgument(format!(
            "date range must be between 0 and {MAX_RANGE_DAYS} days, got {width}"
        )));
    }

    let rows = heatmap_for_project(executor, project_id, start, end, actor_id).await?;
    Ok(ActivityHeatmapResponse {
        items: rows.into_iter().map(|row| ActivityHeatmapItem { date: row.date, count: row.count }).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_width_is_day_difference() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(MAX_RANGE_DAYS);
        assert_eq!((end - start).num_days(), MAX_RANGE_DAYS);
    }
}
