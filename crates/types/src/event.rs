// crates/types/src/event.rs
//! Raw, buffered domain events and the closed schema of fields the
//! aggregator actually consults inside their `detail` document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One of the seven event categories the Recorder's policy gate understands.
///
/// Ordering here is cosmetic; the mapping to a wire string lives in
/// `activity-core::category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Elements,
    Folders,
    Gallery,
    Announcements,
    Projects,
    Comments,
    Widgets,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Elements => "elements",
            EventCategory::Folders => "folders",
            EventCategory::Gallery => "gallery",
            EventCategory::Announcements => "announcements",
            EventCategory::Projects => "projects",
            EventCategory::Comments => "comments",
            EventCategory::Widgets => "widgets",
        }
    }
}

/// The closed set of `detail` fields the aggregator reads, per spec.md §9
/// ("JSON details bags"). Unknown fields are preserved opaquely via
/// `extra` so a future group type can still render them, but the
/// aggregator itself never looks inside `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_snippet: Option<String>,
    /// Fields the aggregator doesn't know about, kept verbatim so they can
    /// still round-trip through storage and reach the feed payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventDetail {
    /// The primary display-name attribute used by single-event titles,
    /// picked in the order `_single_event_title` checks its kind-specific
    /// field: element/folder name, widget name, or announcement title.
    pub fn primary_name(&self) -> Option<&str> {
        self.element_name
            .as_deref()
            .or(self.folder_name.as_deref())
            .or(self.name.as_deref())
            .or(self.title.as_deref())
            .or(self.image_name.as_deref())
            .or(self.project_name.as_deref())
    }

    /// The comment/image snippet text (`text_snippet` wins, then
    /// `image_name`), matching `_group_by_parent`'s `or` fallback.
    pub fn snippet(&self) -> Option<&str> {
        self.text_snippet.as_deref().or(self.image_name.as_deref())
    }
}

/// A raw, fine-grained domain event buffered by the Event Recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: i64,
    pub session_fingerprint: String,
    pub project_id: Uuid,
    pub actor_id: Uuid,
    pub kind: String,
    pub target_id: String,
    pub target_kind: String,
    pub detail: EventDetail,
    pub created_at: DateTime<Utc>,
}

/// Fields required to record a new event, prior to buffer assignment.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub project_id: Uuid,
    pub actor_id: Uuid,
    pub kind: String,
    pub target_id: String,
    pub target_kind: String,
    pub detail: EventDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_name_prefers_element_name() {
        let detail = EventDetail {
            element_name: Some("Hero".into()),
            name: Some("Other".into()),
            ..Default::default()
        };
        assert_eq!(detail.primary_name(), Some("Hero"));
    }

    #[test]
    fn unknown_fields_round_trip() {
        let json = serde_json::json!({
            "element_name": "Hero",
            "some_future_field": 42,
        });
        let detail: EventDetail = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(detail.element_name.as_deref(), Some("Hero"));
        assert_eq!(detail.extra.get("some_future_field"), Some(&Value::from(42)));

        let round_tripped = serde_json::to_value(&detail).unwrap();
        assert_eq!(round_tripped["some_future_field"], 42);
    }
}
