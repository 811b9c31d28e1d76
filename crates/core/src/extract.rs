// crates/core/src/extract.rs
//! Affected-entity extraction: which folders and elements a given event
//! should mark as touched, per its kind.

use activity_types::RawEvent;
use uuid::Uuid;

/// The folders and elements one event affects. Accumulated across a
/// session's events and deduplicated by the caller.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AffectedEntities {
    pub folders: Vec<Uuid>,
    pub elements: Vec<Uuid>,
}

impl AffectedEntities {
    fn push_folder(&mut self, raw: Option<&str>, event_id: i64) {
        if let Some(id) = parse_uuid(raw, event_id, "folder") {
            self.folders.push(id);
        }
    }

    fn push_element(&mut self, raw: Option<&str>, event_id: i64) {
        if let Some(id) = parse_uuid(raw, event_id, "element") {
            self.elements.push(id);
        }
    }
}

fn parse_uuid(raw: Option<&str>, event_id: i64, what: &str) -> Option<Uuid> {
    let raw = raw?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!(event_id, what, raw, %err, "skipping malformed id during entity extraction");
            None
        }
    }
}

/// Extracts the folders and elements `event` affects. Malformed ids are
/// logged and skipped; extraction never aborts the event's processing.
pub fn extract_affected_entities(event: &RawEvent) -> AffectedEntities {
    let mut out = AffectedEntities::default();
    let target_id = event.target_id.as_str();

    match event.kind.as_str() {
        kind if kind.starts_with("folder.") => {
            out.push_folder(Some(target_id), event.id);
        }
        "element.created" | "element.updated" | "element.trashed" | "element.moved" => {
            out.push_element(Some(target_id), event.id);
            if let Some(folder_id) = event.detail.folder_id.as_deref() {
                out.push_folder(Some(folder_id), event.id);
            }
            if event.kind == "element.moved" {
                if let Some(old_folder_id) = event.detail.old_folder_id.as_deref() {
                    out.push_folder(Some(old_folder_id), event.id);
                }
            }
        }
        "comment.created" | "gallery.image.uploaded" => {
            route_by_parent(
                &mut out,
                event.detail.parent_type.as_deref(),
                event.detail.parent_id.as_deref(),
                event.id,
            );
        }
        kind if kind.starts_with("imagemap.") => {
            route_by_parent(
                &mut out,
                event.detail.entity_type.as_deref(),
                event.detail.entity_id.as_deref(),
                event.id,
            );
        }
        _ => {}
    }

    out
}

fn route_by_parent(out: &mut AffectedEntities, parent_type: Option<&str>, parent_id: Option<&str>, event_id: i64) {
    match parent_type {
        Some("folder") => out.push_folder(parent_id, event_id),
        Some("element") => out.push_element(parent_id, event_id),
        Some(other) => {
            tracing::warn!(event_id, parent_type = other, "unrecognized parent type during entity extraction");
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_types::EventDetail;
    use chrono::Utc;

    fn event(kind: &str, target_id: &str, detail: EventDetail) -> RawEvent {
        RawEvent {
            id: 1,
            session_fingerprint: "sf".into(),
            project_id: Uuid::from_u128(1),
            actor_id: Uuid::from_u128(2),
            kind: kind.into(),
            target_id: target_id.into(),
            target_kind: "element".into(),
            detail,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn folder_events_mark_the_folder() {
        let folder_id = Uuid::from_u128(10);
        let evt = event("folder.created", &folder_id.to_string(), EventDetail::default());
        let affected = extract_affected_entities(&evt);
        assert_eq!(affected.folders, vec![folder_id]);
        assert!(affected.elements.is_empty());
    }

    #[test]
    fn element_created_marks_element_and_its_folder() {
        let element_id = Uuid::from_u128(20);
        let folder_id = Uuid::from_u128(21);
        let detail = EventDetail {
            folder_id: Some(folder_id.to_string()),
            ..Default::default()
        };
        let evt = event("element.created", &element_id.to_string(), detail);
        let affected = extract_affected_entities(&evt);
        assert_eq!(affected.elements, vec![element_id]);
        assert_eq!(affected.folders, vec![folder_id]);
    }

    #[test]
    fn element_moved_marks_both_old_and_new_folder() {
        let element_id = Uuid::from_u128(30);
        let new_folder = Uuid::from_u128(31);
        let old_folder = Uuid::from_u128(32);
        let detail = EventDetail {
            folder_id: Some(new_folder.to_string()),
            old_folder_id: Some(old_folder.to_string()),
            ..Default::default()
        };
        let evt = event("element.moved", &element_id.to_string(), detail);
        let affected = extract_affected_entities(&evt);
        assert_eq!(affected.elements, vec![element_id]);
        assert_eq!(affected.folders, vec![new_folder, old_folder]);
    }

    #[test]
    fn comment_on_element_marks_the_element_not_a_folder() {
        let element_id = Uuid::from_u128(40);
        let detail = EventDetail {
            parent_type: Some("element".into()),
            parent_id: Some(element_id.to_string()),
            ..Default::default()
        };
        let evt = event("comment.created", "comment-1", detail);
        let affected = extract_affected_entities(&evt);
        assert_eq!(affected.elements, vec![element_id]);
        assert!(affected.folders.is_empty());
    }

    #[test]
    fn imagemap_routes_by_entity_type() {
        let folder_id = Uuid::from_u128(50);
        let detail = EventDetail {
            entity_type: Some("folder".into()),
            entity_id: Some(folder_id.to_string()),
            ..Default::default()
        };
        let evt = event("imagemap.created", "widget-1", detail);
        let affected = extract_affected_entities(&evt);
        assert_eq!(affected.folders, vec![folder_id]);
    }

    #[test]
    fn malformed_id_is_skipped_not_fatal() {
        let detail = EventDetail {
            folder_id: Some("not-a-uuid".into()),
            ..Default::default()
        };
        let evt = event("element.created", "also-not-a-uuid", detail);
        let affected = extract_affected_entities(&evt);
        assert!(affected.elements.is_empty());
        assert!(affected.folders.is_empty());
    }

    #[test]
    fn unrelated_kind_extracts_nothing() {
        let evt = event("project.updated", "project-1", EventDetail::default());
        let affected = extract_affected_entities(&evt);
        assert!(affected.elements.is_empty());
        assert!(affected.folders.is_empty());
    }
}
