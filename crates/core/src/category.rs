// crates/core/src/category.rs
//! Maps an event kind's prefix (the segment before the first `.`) to the
//! category the Recorder's enablement policy gates on.

use std::collections::HashSet;

use activity_types::EventCategory;

/// Returns the category an event kind belongs to, or `None` if the prefix
/// is not one the policy recognizes. Unrecognized prefixes are treated as
/// enabled by `CategoryPolicy::is_event_type_enabled` — the same
/// fail-open behaviour as the category lookup this is grounded on.
pub fn category_for_event_kind(kind: &str) -> Option<EventCategory> {
    let prefix = kind.split('.').next().unwrap_or(kind);
    match prefix {
        "element" => Some(EventCategory::Elements),
        "folder" => Some(EventCategory::Folders),
        "gallery" => Some(EventCategory::Gallery),
        "announcement" => Some(EventCategory::Announcements),
        "project" => Some(EventCategory::Projects),
        "comment" => Some(EventCategory::Comments),
        "imagemap" => Some(EventCategory::Widgets),
        _ => None,
    }
}

/// The Recorder's per-category enablement gate.
#[derive(Debug, Clone)]
pub struct CategoryPolicy {
    enabled: HashSet<EventCategory>,
}

impl CategoryPolicy {
    pub fn new(enabled: impl IntoIterator<Item = EventCategory>) -> Self {
        Self {
            enabled: enabled.into_iter().collect(),
        }
    }

    /// All seven categories enabled, the default policy.
    pub fn all_enabled() -> Self {
        Self::new([
            EventCategory::Elements,
            EventCategory::Folders,
            EventCategory::Gallery,
            EventCategory::Announcements,
            EventCategory::Projects,
            EventCategory::Comments,
            EventCategory::Widgets,
        ])
    }

    /// Whether an event of this kind should be recorded. Kinds with an
    /// unrecognized prefix are always enabled.
    pub fn is_event_kind_enabled(&self, kind: &str) -> bool {
        match category_for_event_kind(kind) {
            Some(category) => self.enabled.contains(&category),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_prefixes() {
        assert_eq!(category_for_event_kind("element.created"), Some(EventCategory::Elements));
        assert_eq!(category_for_event_kind("imagemap.deleted"), Some(EventCategory::Widgets));
        assert_eq!(category_for_event_kind("gallery.image.uploaded"), Some(EventCategory::Gallery));
    }

    #[test]
    fn unknown_prefix_has_no_category() {
        assert_eq!(category_for_event_kind("webhook.fired"), None);
    }

    #[test]
    fn unknown_prefix_is_enabled_by_default() {
        let policy = CategoryPolicy::new([EventCategory::Elements]);
        assert!(policy.is_event_kind_enabled("webhook.fired"));
        assert!(policy.is_event_kind_enabled("element.created"));
        assert!(!policy.is_event_kind_enabled("folder.created"));
    }

    #[test]
    fn all_enabled_allows_every_known_category() {
        let policy = CategoryPolicy::all_enabled();
        assert!(policy.is_event_kind_enabled("comment.created"));
        assert!(policy.is_event_kind_enabled("imagemap.created"));
    }
}
