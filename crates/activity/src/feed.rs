// crates/activity/src/feed.rs
//! Feed Reader (C3): paged, permission-filtered activity queries for a
//! project, a folder (transitively), or an element, with post-query
//! image-URL enrichment.

use std::collections::HashMap;

use sqlx::PgExecutor;
use uuid::Uuid;

use activity_db::{list_activities, ActivityFilter, ActivityScope};
use activity_types::{ActivityFeedResponse, ActivityItem, UserRef};

use crate::collaborators::{ActorDirectory, ImageStore, PermissionOracle, ResourceScope};
use crate::error::FeedError;

#[derive(Debug, Clone)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

pub async fn get_project_feed<'e, E>(
    executor: E,
    oracle: &dyn PermissionOracle,
    actor_directory: &dyn ActorDirectory,
    image_store: &dyn ImageStore,
    project_id: Uuid,
    actor_id: Uuid,
    page: Page,
) -> Result<ActivityFeedResponse, FeedError>
where
    E: PgExecutor<'e> + Copy,
{
    oracle
        .require_read(ResourceScope::Project, project_id, actor_id)
        .await
        .map_err(|_| FeedError::Forbidden)?;

    let accessible_folders = oracle.accessible_folders(project_id, actor_id).await.map_err(|_| FeedError::Forbidden)?;
    let accessible_elements = oracle.accessible_elements(project_id, actor_id).await.map_err(|_| FeedError::Forbidden)?;

    let (rows, total) = list_activities(
        executor,
        &ActivityFilter {
            project_id,
            scope: ActivityScope::Project,
            page: page.page,
            size: page.size,
        },
    )
    .await?;

    // Project scope additionally requires that every affected id in a row
    // is in the actor's accessible set, unless the array is empty (an
    // activity with no folder/element claims is visible to anyone who
    // can see the project itself).
    let rows: Vec<_> = rows
        .into_iter()
        .filter(|activity| {
            (activity.affected_folders.is_empty() || accessible_folders.contains_all(&activity.affected_folders))
                && (activity.affected_elements.is_empty() || accessible_elements.contains_all(&activity.affected_elements))
        })
        .collect();

    build_response(rows, total, page, actor_directory, image_store).await
}

pub async fn get_folder_feed<'e, E>(
    executor: E,
    oracle: &dyn PermissionOracle,
    actor_directory: &dyn ActorDirectory,
    image_store: &dyn ImageStore,
    project_id: Uuid,
    folder_id: Uuid,
    actor_id: Uuid,
    page: Page,
) -> Result<ActivityFeedResponse, FeedError>
where
    E: PgExecutor<'e> + Copy,
{
    if !oracle.folder_exists(folder_id).await.map_err(|_| FeedError::Forbidden)? {
        return Err(FeedError::NotFound {
            scope: "folder",
            id: folder_id.to_string(),
        });
    }
    oracle
        .require_read(ResourceScope::Folder, folder_id, actor_id)
        .await
        .map_err(|_| FeedError::Forbidden)?;

    let descendants = oracle.folder_descendants(folder_id).await.map_err(|_| FeedError::Forbidden)?;

    let (rows, total) = list_activities(
        executor,
        &ActivityFilter {
            project_id,
            scope: ActivityScope::Folder { folder_ids: descendants },
            page: page.page,
            size: page.size,
        },
    )
    .await?;

    build_response(rows, total, page, actor_directory, image_store).await
}

pub async fn get_element_feed<'e, E>(
    executor: E,
    oracle: &dyn PermissionOracle,
    actor_directory: &dyn ActorDirectory,
    image_store: &dyn ImageStore,
    project_id: Uuid,
    element_id: Uuid,
    actor_id: Uuid,
    page: Page,
) -> Result<ActivityFeedResponse, FeedError>
where
    E: PgExecutor<'e> + Copy,
{
    if !oracle.element_exists(element_id).await.map_err(|_| FeedError::Forbidden)? {
        return Err(FeedError::NotFound {
            scope: "element",
            id: element_id.to_string(),
        });
    }
    oracle
        .require_read(ResourceScope::Element, element_id, actor_id)
        .await
        .map_err(|_| FeedError::Forbidden)?;

    let (rows, total) = list_activities(
        executor,
        &ActivityFilter {
            project_id,
            scope: ActivityScope::Element { element_id },
            page: page.page,
            size: page.size,
        },
    )
    .await?;

    build_response(rows, total, page, actor_directory, image_store).await
}

async fn build_response(
    rows: Vec<activity_types::Activity>,
    total: i64,
    page: Page,
    actor_directory: &dyn ActorDirectory,
    image_store: &dyn ImageStore,
) -> Result<ActivityFeedResponse, FeedError> {
    let mut items = Vec::with_capacity(rows.len());
    for activity in rows {
        let user_name = actor_directory
            .display_name(activity.actor_id)
            .await
            .unwrap_or_else(|_| "Пользователь".to_string());
        items.push(ActivityItem {
            id: activity.id,
            title: activity.title,
            summary: activity.summary,
            started_at: activity.started_at,
            ended_at: activity.ended_at,
            user: UserRef {
                id: activity.actor_id,
                name: user_name,
            },
        });
    }

    enrich_images(&mut items, image_store).await?;

    let pages = if page.size == 0 {
        0
    } else {
        ((total as u32) + page.size - 1) / page.size
    };

    Ok(ActivityFeedResponse {
        items,
        total,
        page: page.page,
        size: page.size,
        pages,
    })
}

/// Splices current `thumbnailUrl`/`url` fields into every `images_uploaded`
/// item across the page, via one batched lookup. Items whose image was
/// deleted since upload (a miss in the store) are left untouched.
async fn enrich_images(items: &mut [ActivityItem], image_store: &dyn ImageStore) -> Result<(), FeedError> {
    let mut ids: Vec<String> = Vec::new();
    for item in items.iter() {
        for group in &item.summary.groups {
            if let activity_types::Group::ImagesUploaded { items_by_parent, .. } = group {
                for snippets in items_by_parent.values() {
                    for snippet in snippets {
                        ids.push(snippet.id.clone());
                    }
                }
            }
        }
    }
    if ids.is_empty() {
        return Ok(());
    }
    ids.sort_unstable();
    ids.dedup();

    let locations: HashMap<String, crate::collaborators::ImageLocation> = image_store.locate_many(&ids).await?;

    for item in items.iter_mut() {
        for group in &mut item.summary.groups {
            if let activity_types::Group::ImagesUploaded { items_by_parent, .. } = group {
                for snippets in items_by_parent.values_mut() {
                    for snippet in snippets.iter_mut() {
                        if let Some(location) = locations.get(&snippet.id) {
                            snippet.thumbnail_url = Some(location.thumbnail_url.clone());
                            snippet.url = Some(location.url.clone());
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
