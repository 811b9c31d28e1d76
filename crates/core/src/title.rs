// crates/core/src/title.rs
//! Russian-locale title generation for an aggregated session: a single
//! short sentence summarizing what an actor did.

use activity_types::RawEvent;

use crate::plural::plural_form;

/// `(one, few, many)` noun forms for `plural_form`.
type NounForms = (&'static str, &'static str, &'static str);

fn single_event_phrase(kind: &str, name: Option<&str>) -> Option<String> {
    let named = |verb: &str| match name {
        Some(name) => format!("{verb} «{name}»"),
        None => verb.to_string(),
    };
    let phrase = match kind {
        "element.created" => named("создал(а) элемент"),
        "element.updated" => named("обновил(а) элемент"),
        "element.trashed" => named("удалил(а) элемент"),
        "folder.created" => named("создал(а) папку"),
        "folder.updated" => named("обновил(а) папку"),
        "folder.trashed" => named("удалил(а) папку"),
        "comment.created" => "оставил(а) комментарий".to_string(),
        "gallery.image.uploaded" => named("загрузил(а) изображение"),
        "announcement.created" => named("создал(а) задачу"),
        "announcement.updated" => named("обновил(а) задачу"),
        "project.updated" => named("обновил(а) проект"),
        "imagemap.created" => named("создал(а) виджет"),
        "imagemap.updated" => named("обновил(а) виджет"),
        "imagemap.deleted" => named("удалил(а) виджет"),
        _ => return None,
    };
    Some(phrase)
}

fn same_type_verb_and_noun(kind: &str) -> Option<(&'static str, NounForms)> {
    match kind {
        "element.created" => Some(("создал(а)", ("элемент", "элемента", "элементов"))),
        "element.updated" => Some(("обновил(а)", ("элемент", "элемента", "элементов"))),
        "element.trashed" => Some(("удалил(а)", ("элемент", "элемента", "элементов"))),
        "folder.created" => Some(("создал(а)", ("папку", "папки", "папок"))),
        "folder.updated" => Some(("обновил(а)", ("папку", "папки", "папок"))),
        "comment.created" => Some(("оставил(а)", ("комментарий", "комментария", "комментариев"))),
        "gallery.image.uploaded" => Some(("загрузил(а)", ("изображение", "изображения", "изображений"))),
        "announcement.created" => Some(("создал(а)", ("задачу", "задачи", "задач"))),
        "imagemap.created" => Some(("создал(а)", ("виджет", "виджета", "виджетов"))),
        "imagemap.updated" => Some(("обновил(а)", ("виджет", "виджета", "виджетов"))),
        "imagemap.deleted" => Some(("удалил(а)", ("виджет", "виджета", "виджетов"))),
        _ => None,
    }
}

/// Generates a title for a session's events. `user_name` is the resolved
/// display name of the session's single actor.
pub fn generate_title(user_name: &str, events: &[RawEvent]) -> String {
    if events.is_empty() {
        return format!("{user_name} выполнил(а) действие");
    }
    if events.len() == 1 {
        return single_event_title(user_name, &events[0]);
    }
    let distinct_kinds: std::collections::HashSet<&str> = events.iter().map(|e| e.kind.as_str()).collect();
    if distinct_kinds.len() == 1 {
        same_type_events_title(user_name, events)
    } else {
        mixed_events_title(user_name, events)
    }
}

fn single_event_title(user_name: &str, event: &RawEvent) -> String {
    match single_event_phrase(&event.kind, event.detail.primary_name()) {
        Some(phrase) => format!("{user_name} {phrase}"),
        None => format!("{user_name} выполнил(а) действие"),
    }
}

fn same_type_events_title(user_name: &str, events: &[RawEvent]) -> String {
    let kind = events[0].kind.as_str();
    match same_type_verb_and_noun(kind) {
        Some((verb, (one, few, many))) => {
            let noun = plural_form(events.len() as i64, one, few, many);
            format!("{user_name} {verb} {count} {noun}", count = events.len())
        }
        None => {
            let noun = plural_form(events.len() as i64, "действие", "действия", "действий");
            format!("{user_name} выполнил(а) {count} {noun}", count = events.len())
        }
    }
}

/// Priority bucket an event kind falls into for mixed-session titles:
/// creations outrank updates, which outrank comments, which outrank
/// uploaded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ActionPriority {
    Creation,
    Update,
    Comment,
    Image,
}

fn creation_noun(kind: &str) -> Option<&'static str> {
    match kind {
        "element.created" => Some("элемент"),
        "folder.created" => Some("папку"),
        "imagemap.created" => Some("виджет"),
        _ => None,
    }
}

fn is_update_kind(kind: &str) -> bool {
    matches!(
        kind,
        "element.updated" | "folder.updated" | "announcement.updated" | "imagemap.updated"
    )
}

fn mixed_events_title(user_name: &str, events: &[RawEvent]) -> String {
    let mut created_nouns: Vec<&'static str> = Vec::new();
    let mut seen_created_nouns: std::collections::HashSet<&'static str> = std::collections::HashSet::new();
    let mut updated_count = 0usize;
    let mut comment_count = 0usize;
    let mut image_count = 0usize;

    for event in events {
        if let Some(noun) = creation_noun(&event.kind) {
            if seen_created_nouns.insert(noun) {
                created_nouns.push(noun);
            }
        } else if is_update_kind(&event.kind) {
            updated_count += 1;
        } else if event.kind == "comment.created" {
            comment_count += 1;
        } else if event.kind == "gallery.image.uploaded" {
            image_count += 1;
        }
    }

    let mut priority_actions: Vec<(ActionPriority, String)> = Vec::new();
    if !created_nouns.is_empty() {
        priority_actions.push((ActionPriority::Creation, format!("создал(а) {}", created_nouns.join(" и "))));
    }
    if updated_count > 0 {
        let noun = plural_form(updated_count as i64, "объект", "объекта", "объектов");
        priority_actions.push((ActionPriority::Update, format!("обновил(а) {updated_count} {noun}")));
    }
    if comment_count > 0 {
        let noun = plural_form(comment_count as i64, "комментарий", "комментария", "комментариев");
        priority_actions.push((ActionPriority::Comment, format!("добавил(а) {comment_count} {noun}")));
    }
    if image_count > 0 {
        let noun = plural_form(image_count as i64, "изображение", "изображения", "изображений");
        priority_actions.push((ActionPriority::Image, format!("загрузил(а) {image_count} {noun}")));
    }

    if priority_actions.is_empty() {
        let noun = plural_form(events.len() as i64, "действие", "действия", "действий");
        return format!("{user_name} выполнил(а) {count} {noun} в проекте", count = events.len());
    }

    priority_actions.sort_by_key(|(priority, _)| *priority);
    let extra_count = priority_actions.len().saturating_sub(2);
    let head: Vec<String> = priority_actions.into_iter().take(2).map(|(_, phrase)| phrase).collect();
    let mut title = format!("{user_name} {}", head.join(" и "));
    if extra_count > 0 {
        let noun = plural_form(extra_count as i64, "действие", "действия", "действий");
        title.push_str(&format!(" (+еще {extra_count} {noun})"));
    }
    title
}
