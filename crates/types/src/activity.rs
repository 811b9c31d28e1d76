// crates/types/src/activity.rs
//! The aggregated `Activity` record and the summary groups it carries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

/// An item referenced by id and an optional display name, used by the
/// `*_created`/`*_updated` groups (elements, folders, announcements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NamedItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A widget (imagemap) item, additionally carrying the entity kind it
/// decorates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WidgetItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

/// An item referenced by id with a short text snippet, used by the
/// parent-grouped kinds (comments, uploaded images). `thumbnail_url`/`url`
/// are absent until the Feed Reader's image-enrichment pass splices in
/// the image's current location; they stay `None` for comment items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnippetItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(rename = "thumbnailUrl", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One summary group within an `Activity`. The `type` tag and field shape
/// mirror the ten group kinds the aggregator builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Group {
    ElementsCreated { count: usize, items: Vec<NamedItem> },
    ElementsUpdated { count: usize, items: Vec<NamedItem> },
    FoldersCreated { count: usize, items: Vec<NamedItem> },
    FoldersUpdated { count: usize, items: Vec<NamedItem> },
    AnnouncementsCreated { count: usize, items: Vec<NamedItem> },
    WidgetsCreated { count: usize, items: Vec<WidgetItem> },
    WidgetsUpdated { count: usize, items: Vec<WidgetItem> },
    WidgetsDeleted { count: usize, items: Vec<WidgetItem> },
    CommentsAdded {
        count: usize,
        items_by_parent: BTreeMap<String, Vec<SnippetItem>>,
    },
    ImagesUploaded {
        count: usize,
        items_by_parent: BTreeMap<String, Vec<SnippetItem>>,
    },
}

impl Group {
    /// The number of underlying events this group was built from, used by
    /// title generation's mixed/same-type counting.
    pub fn count(&self) -> usize {
        match self {
            Group::ElementsCreated { count, .. }
            | Group::ElementsUpdated { count, .. }
            | Group::FoldersCreated { count, .. }
            | Group::FoldersUpdated { count, .. }
            | Group::AnnouncementsCreated { count, .. }
            | Group::WidgetsCreated { count, .. }
            | Group::WidgetsUpdated { count, .. }
            | Group::WidgetsDeleted { count, .. }
            | Group::CommentsAdded { count, .. }
            | Group::ImagesUploaded { count, .. } => *count,
        }
    }
}

/// A session's aggregated, Russian-titled summary of what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub groups: Vec<Group>,
}

/// One row in the `activities` table: the unit the Feed Reader serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: i64,
    pub project_id: Uuid,
    pub actor_id: Uuid,
    pub title: String,
    pub summary: Summary,
    pub affected_folders: Vec<Uuid>,
    pub affected_elements: Vec<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// One row in the `daily_counters` table: a per-day, per-project,
/// per-actor rollup used by the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub activity_date: chrono::NaiveDate,
    pub project_id: Uuid,
    pub actor_id: Uuid,
    pub event_count: i64,
    pub updated_at: DateTime<Utc>,
}
