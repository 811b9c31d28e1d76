// crates/types/src/feed.rs
//! Paged response payloads served by the Feed Reader and Heatmap Reader.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::activity::Summary;

/// The minimal user reference embedded in a feed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
}

/// One entry in a feed response: an activity plus its resolved actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityItem {
    pub id: i64,
    pub title: String,
    pub summary: Summary,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub user: UserRef,
}

/// A page of activity feed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityFeedResponse {
    pub items: Vec<ActivityItem>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

/// One day's event count in a heatmap response. Days with zero events are
/// omitted entirely rather than represented as a zero entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityHeatmapItem {
    pub date: NaiveDate,
    pub count: i64,
}

/// The full date-range heatmap response for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityHeatmapResponse {
    pub items: Vec<ActivityHeatmapItem>,
}
