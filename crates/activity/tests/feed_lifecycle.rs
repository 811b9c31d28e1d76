use activity_feed::collaborators::test_doubles::{AllowAllOracle, StaticActorDirectory, StaticImageStore};
use activity_feed::collaborators::{AccessibleScope, ImageLocation, PermissionOracle, ResourceScope};
use activity_feed::{aggregate, get_project_feed, record, AggregateOutcome, FeedConfig, Page};
use activity_types::{EventDetail, Group, NewEvent};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

fn new_event(project_id: Uuid, actor_id: Uuid, kind: &str, target_id: &str, detail: EventDetail) -> NewEvent {
    NewEvent {
        project_id,
        actor_id,
        kind: kind.to_string(),
        target_id: target_id.to_string(),
        target_kind: "element".to_string(),
        detail,
    }
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn recorded_session_aggregates_into_a_queryable_activity(pool: PgPool) -> sqlx::Result<()> {
    let config = FeedConfig::default();
    let project_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();
    let element_id = Uuid::new_v4();
    let now = Utc::now();

    record(
        &pool,
        &config,
        new_event(
            project_id,
            actor_id,
            "element.created",
            &element_id.to_string(),
            EventDetail {
                element_name: Some("Hero banner".into()),
                ..Default::default()
            },
        ),
        now,
    )
    .await
    .unwrap()
    .expect("category enabled");

    let session_fingerprint = activity_core::session::session_fingerprint(actor_id, project_id, now, config.session_window_secs);

    // Before the window elapses the aggregator must defer, not consume.
    let mut tx = pool.begin().await?;
    let outcome = aggregate(
        &mut *tx,
        &config,
        &StaticActorDirectory::new(),
        &session_fingerprint,
        now + Duration::seconds(10),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, AggregateOutcome::Deferred));
    tx.commit().await?;

    let actor_directory = StaticActorDirectory::new();
    actor_directory.set_name(actor_id, "Алиса");

    let mut tx = pool.begin().await?;
    let outcome = aggregate(
        &mut *tx,
        &config,
        &actor_directory,
        &session_fingerprint,
        now + Duration::seconds(config.session_window_secs),
    )
    .await
    .unwrap();
    tx.commit().await?;

    let activity_id = match outcome {
        AggregateOutcome::Aggregated { activity_id, event_count } => {
            assert_eq!(event_count, 1);
            activity_id
        }
        other => panic!("expected an aggregated activity, got {other:?}"),
    };

    let oracle = AllowAllOracle::new();
    let image_store = StaticImageStore::new();
    let feed = get_project_feed(&pool, &oracle, &actor_directory, &image_store, project_id, actor_id, Page { page: 1, size: 10 })
        .await
        .unwrap();

    assert_eq!(feed.total, 1);
    assert_eq!(feed.items[0].id, activity_id);
    assert_eq!(feed.items[0].title, "Алиса создал(а) элемент «Hero banner»");
    assert_eq!(feed.items[0].user.name, "Алиса");
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn project_feed_hides_activities_outside_the_accessible_scope(pool: PgPool) -> sqlx::Result<()> {
    let project_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();
    let visible_folder = Uuid::new_v4();
    let hidden_folder = Uuid::new_v4();
    let now = Utc::now();

    for folder in [visible_folder, hidden_folder] {
        activity_db::insert_activity(
            &pool,
            &activity_db::NewActivityRow {
                project_id,
                actor_id,
                title: "test".to_string(),
                summary: activity_types::Summary { groups: vec![] },
                affected_folders: vec![folder],
                affected_elements: vec![],
                started_at: now,
                ended_at: now,
            },
        )
        .await
        .unwrap();
    }

    struct OnlyVisible(Uuid);

    #[async_trait::async_trait]
    impl PermissionOracle for OnlyVisible {
        async fn require_read(
            &self,
            _scope: ResourceScope,
            _id: Uuid,
            _actor_id: Uuid,
        ) -> Result<(), activity_feed::collaborators::PermissionError> {
            Ok(())
        }

        async fn accessible_folders(
            &self,
            _project_id: Uuid,
            _actor_id: Uuid,
        ) -> Result<AccessibleScope, activity_feed::collaborators::PermissionError> {
            Ok(AccessibleScope::Ids([self.0].into_iter().collect()))
        }

        async fn accessible_elements(
            &self,
            _project_id: Uuid,
            _actor_id: Uuid,
        ) -> Result<AccessibleScope, activity_feed::collaborators::PermissionError> {
            Ok(AccessibleScope::All)
        }

        async fn folder_exists(&self, _folder_id: Uuid) -> Result<bool, activity_feed::collaborators::PermissionError> {
            Ok(true)
        }

        async fn element_exists(&self, _element_id: Uuid) -> Result<bool, activity_feed::collaborators::PermissionError> {
            Ok(true)
        }

        async fn folder_descendants(&self, folder_id: Uuid) -> Result<Vec<Uuid>, activity_feed::collaborators::PermissionError> {
            Ok(vec![folder_id])
        }
    }

    let oracle = OnlyVisible(visible_folder);
    let actor_directory = StaticActorDirectory::new();
    let image_store = StaticImageStore::new();

    let feed = get_project_feed(&pool, &oracle, &actor_directory, &image_store, project_id, actor_id, Page { page: 1, size: 10 })
        .await
        .unwrap();

    assert_eq!(feed.total, 2, "storage-level total is unfiltered");
    assert_eq!(feed.items.len(), 1, "only the accessible-folder activity survives permission filtering");
    assert_eq!(feed.items[0].summary, activity_types::Summary { groups: vec![] });
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn image_enrichment_splices_urls_and_leaves_misses_untouched(pool: PgPool) -> sqlx::Result<()> {
    let project_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();
    let now = Utc::now();

    let mut items_by_parent = std::collections::BTreeMap::new();
    items_by_parent.insert(
        "element:el-1".to_string(),
        vec![
            activity_types::SnippetItem {
                id: "image-known".to_string(),
                snippet: Some("photo.png".to_string()),
                thumbnail_url: None,
                url: None,
            },
            activity_types::SnippetItem {
                id: "image-deleted".to_string(),
                snippet: Some("gone.png".to_string()),
                thumbnail_url: None,
                url: None,
            },
        ],
    );
    let summary = activity_types::Summary {
        groups: vec![Group::ImagesUploaded { count: 2, items_by_parent }],
    };

    activity_db::insert_activity(
        &pool,
        &activity_db::NewActivityRow {
            project_id,
            actor_id,
            title: "test".to_string(),
            summary,
            affected_folders: vec![],
            affected_elements: vec![],
            started_at: now,
            ended_at: now,
        },
    )
    .await
    .unwrap();

    let oracle = AllowAllOracle::new();
    let actor_directory = StaticActorDirectory::new();
    let image_store = StaticImageStore::new();
    image_store.set_location(
        "image-known",
        ImageLocation {
            thumbnail_url: "https://cdn.example/thumb.png".to_string(),
            url: "https://cdn.example/full.png".to_string(),
        },
    );

    let feed = get_project_feed(&pool, &oracle, &actor_directory, &image_store, project_id, actor_id, Page { page: 1, size: 10 })
        .await
        .unwrap();

    let Group::ImagesUploaded { items_by_parent, .. } = &feed.items[0].summary.groups[0] else {
        panic!("expected an images_uploaded group");
    };
    let items = items_by_parent.get("element:el-1").unwrap();
    let known = items.iter().find(|item| item.id == "image-known").unwrap();
    assert_eq!(known.url.as_deref(), Some("https://cdn.example/full.png"));
    let missing = items.iter().find(|item| item.id == "image-deleted").unwrap();
    assert!(missing.url.is_none());
}
