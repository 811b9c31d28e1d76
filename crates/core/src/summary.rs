// crates/core/src/summary.rs
//! Assembles a session's raw events into the ten summary group kinds the
//! feed renders.

use std::collections::{BTreeMap, HashMap};

use activity_types::{Group, NamedItem, RawEvent, SnippetItem, Summary, WidgetItem};

const SNIPPET_MAX_CHARS: usize = 75;

/// Truncates a comment/image snippet to `SNIPPET_MAX_CHARS`, appending an
/// ellipsis when it was cut short. Image names are left untouched by
/// `EventDetail::snippet` already being short; this only bites on
/// longer comment bodies.
fn truncate_snippet(snippet: &str) -> String {
    let char_count = snippet.chars().count();
    if char_count <= SNIPPET_MAX_CHARS {
        return snippet.to_string();
    }
    let head: String = snippet.chars().take(SNIPPET_MAX_CHARS).collect();
    format!("{head}…")
}

/// An insertion-ordered, last-write-wins collection keyed by target id.
/// Mirrors the Python `dict[target_id] = item` pattern: repeated writes to
/// an existing key replace its value without moving its position.
#[derive(Default)]
struct UpsertList<T> {
    order: Vec<String>,
    by_key: HashMap<String, T>,
}

impl<T> UpsertList<T> {
    fn upsert(&mut self, key: String, value: T) {
        if !self.by_key.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.by_key.insert(key, value);
    }

    fn into_vec(mut self) -> Vec<T> {
        self.order
            .into_iter()
            .filter_map(|key| self.by_key.remove(&key))
            .collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[derive(Default)]
struct GroupedSnippets {
    order: Vec<String>,
    by_parent: BTreeMap<String, Vec<SnippetItem>>,
    count: usize,
}

impl GroupedSnippets {
    fn push(&mut self, parent_key: String, item: SnippetItem) {
        self.by_parent.entry(parent_key).or_insert_with(Vec::new).push(item);
        self.count += 1;
    }
}

/// Builds the summary groups for one session's worth of raw events.
///
/// Only `*.created`/`*.updated` (plus comments and uploaded images) events
/// contribute a group; `*.trashed` and `element.moved` affect extraction
/// and title generation only.
pub fn build_summary(events: &[RawEvent]) -> Summary {
    let mut elements_created: Vec<NamedItem> = Vec::new();
    let mut elements_updated: UpsertList<NamedItem> = UpsertList::default();
    let mut folders_created: Vec<NamedItem> = Vec::new();
    let mut folders_updated: UpsertList<NamedItem> = UpsertList::default();
    let mut announcements_created: Vec<NamedItem> = Vec::new();
    let mut widgets_created: Vec<WidgetItem> = Vec::new();
    let mut widgets_updated: UpsertList<WidgetItem> = UpsertList::default();
    let mut widgets_deleted: Vec<WidgetItem> = Vec::new();
    let mut comments_added = GroupedSnippets::default();
    let mut images_uploaded = GroupedSnippets::default();

    for event in events {
        let name = event.detail.primary_name().map(str::to_string);
        let named = || NamedItem {
            id: event.target_id.clone(),
            name: name.clone(),
        };

        match event.kind.as_str() {
            "element.created" => elements_created.push(named()),
            "element.updated" => elements_updated.upsert(event.target_id.clone(), named()),
            "folder.created" => folders_created.push(named()),
            "folder.updated" => folders_updated.upsert(event.target_id.clone(), named()),
            "announcement.created" => announcements_created.push(named()),
            "imagemap.created" | "imagemap.updated" | "imagemap.deleted" => {
                let widget = WidgetItem {
                    id: event.target_id.clone(),
                    name: name.clone(),
                    entity_type: event.detail.entity_type.clone(),
                };
                match event.kind.as_str() {
                    "imagemap.created" => widgets_created.push(widget),
                    "imagemap.updated" => widgets_updated.upsert(event.target_id.clone(), widget),
                    _ => widgets_deleted.push(widget),
                }
            }
            "comment.created" => {
                if let Some(parent_key) = parent_group_key(event) {
                    comments_added.push(
                        parent_key,
                        SnippetItem {
                            id: event.target_id.clone(),
                            snippet: event.detail.snippet().map(truncate_snippet),
                            thumbnail_url: None,
                            url: None,
                        },
                    );
                }
            }
            "gallery.image.uploaded" => {
                if let Some(parent_key) = parent_group_key(event) {
                    images_uploaded.push(
                        parent_key,
                        SnippetItem {
                            id: event.target_id.clone(),
                            snippet: event.detail.snippet().map(truncate_snippet),
                            thumbnail_url: None,
                            url: None,
                        },
                    );
                }
            }
            _ => {}
        }
    }

    let mut groups = Vec::new();
    if !elements_created.is_empty() {
        groups.push(Group::ElementsCreated {
            count: elements_created.len(),
            items: elements_created,
        });
    }
    if elements_updated.len() > 0 {
        groups.push(Group::ElementsUpdated {
            count: elements_updated.len(),
            items: elements_updated.into_vec(),
        });
    }
    if !folders_created.is_empty() {
        groups.push(Group::FoldersCreated {
            count: folders_created.len(),
            items: folders_created,
        });
    }
    if folders_updated.len() > 0 {
        groups.push(Group::FoldersUpdated {
            count: folders_updated.len(),
            items: folders_updated.into_vec(),
        });
    }
    if !announcements_created.is_empty() {
        groups.push(Group::AnnouncementsCreated {
            count: announcements_created.len(),
            items: announcements_created,
        });
    }
    if !widgets_created.is_empty() {
        groups.push(Group::WidgetsCreated {
            count: widgets_created.len(),
            items: widgets_created,
        });
    }
    if widgets_updated.len() > 0 {
        groups.push(Group::WidgetsUpdated {
            count: widgets_updated.len(),
            items: widgets_updated.into_vec(),
        });
    }
    if !widgets_deleted.is_empty() {
        groups.push(Group::WidgetsDeleted {
            count: widgets_deleted.len(),
            items: widgets_deleted,
        });
    }
    if comments_added.count > 0 {
        groups.push(Group::CommentsAdded {
            count: comments_added.count,
            items_by_parent: comments_added.by_parent,
        });
    }
    if images_uploaded.count > 0 {
        groups.push(Group::ImagesUploaded {
            count: images_uploaded.count,
            items_by_parent: images_uploaded.by_parent,
        });
    }

    Summary { groups }
}

fn parent_group_key(event: &RawEvent) -> Option<String> {
    let parent_type = event.detail.parent_type.as_deref()?;
    let parent_id = event.detail.parent_id.as_deref()?;
    Some(format!("{parent_type}:{parent_id}"))
}
