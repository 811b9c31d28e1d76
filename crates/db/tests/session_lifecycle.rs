use activity_db::{
    claim_session_events, complete_job, delete_events, enqueue, heatmap_for_project, insert_activity, insert_event,
    list_activities, upsert_daily_counter, ActivityFilter, ActivityScope, NewActivityRow, NewJob,
};
use activity_types::{EventDetail, NewEvent, Summary};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

fn new_event(project_id: Uuid, actor_id: Uuid, kind: &str) -> NewEvent {
    NewEvent {
        project_id,
        actor_id,
        kind: kind.to_string(),
        target_id: Uuid::new_v4().to_string(),
        target_kind: "element".to_string(),
        detail: EventDetail::default(),
    }
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn claimed_events_are_no_longer_buffered_after_deletion(pool: PgPool) -> sqlx::Result<()> {
    let project_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();
    let session_fingerprint = "sf-1";

    insert_event(&pool, &new_event(project_id, actor_id, "element.created"), session_fingerprint)
        .await
        .unwrap();
    insert_event(&pool, &new_event(project_id, actor_id, "element.updated"), session_fingerprint)
        .await
        .unwrap();

    let mut tx = pool.begin().await?;
    let claimed = claim_session_events(&mut *tx, session_fingerprint).await.unwrap();
    assert_eq!(claimed.events.len(), 2);
    delete_events(&mut *tx, &claimed.ids()).await.unwrap();
    tx.commit().await?;

    let mut tx = pool.begin().await?;
    let remaining = claim_session_events(&mut *tx, session_fingerprint).await.unwrap();
    assert!(remaining.events.is_empty());

    Ok(())
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn feed_scopes_narrow_by_folder_and_element(pool: PgPool) -> sqlx::Result<()> {
    let project_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();
    let folder_id = Uuid::new_v4();
    let element_id = Uuid::new_v4();
    let other_element_id = Uuid::new_v4();
    let now = Utc::now();

    for (folders, elements) in [
        (vec![folder_id], vec![element_id]),
        (vec![], vec![other_element_id]),
    ] {
        insert_activity(
            &pool,
            &NewActivityRow {
                project_id,
                actor_id,
                title: "test activity".to_string(),
                summary: Summary { groups: vec![] },
                affected_folders: folders,
                affected_elements: elements,
                started_at: now,
                ended_at: now,
            },
        )
        .await
        .unwrap();
    }

    let (project_feed, project_total) = list_activities(
        &pool,
        &ActivityFilter {
            project_id,
            scope: ActivityScope::Project,
            page: 1,
            size: 10,
        },
    )
    .await
    .unwrap();
    assert_eq!(project_total, 2);
    assert_eq!(project_feed.len(), 2);

    let (folder_feed, folder_total) = list_activities(
        &pool,
        &ActivityFilter {
            project_id,
            scope: ActivityScope::Folder { folder_ids: vec![folder_id] },
            page: 1,
            size: 10,
        },
    )
    .await
    .unwrap();
    assert_eq!(folder_total, 1);
    assert_eq!(folder_feed[0].affected_folders, vec![folder_id]);

    let (element_feed, element_total) = list_activities(
        &pool,
        &ActivityFilter {
            project_id,
            scope: ActivityScope::Element { element_id },
            page: 1,
            size: 10,
        },
    )
    .await
    .unwrap();
    assert_eq!(element_total, 1);
    assert_eq!(element_feed[0].affected_elements, vec![element_id]);

    Ok(())
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn daily_counters_accumulate_across_sessions(pool: PgPool) -> sqlx::Result<()> {
    let project_id = Uuid::new_v4();
    let actor_id = Uuid::new_v4();
    let today = Utc::now().date_naive();

    upsert_daily_counter(&pool, today, project_id, actor_id, 3).await.unwrap();
    upsert_daily_counter(&pool, today, project_id, actor_id, 2).await.unwrap();

    let heatmap = heatmap_for_project(&pool, project_id, today, today, None).await.unwrap();
    assert_eq!(heatmap.len(), 1);
    assert_eq!(heatmap[0].count, 5);

    Ok(())
}

#[sqlx::test(migrator = "activity_db::MIGRATOR")]
async fn enqueueing_the_same_idempotency_key_postpones_instead_of_duplicating(pool: PgPool) -> sqlx::Result<()> {
    let now = Utc::now();
    let key = "activity_session:sf-1";

    enqueue(
        &pool,
        &NewJob {
            job_name: "process_activity_session".to_string(),
            payload: "sf-1".to_string(),
            idempotency_key: key.to_string(),
            run_at: now,
        },
    )
    .await
    .unwrap();

    let later = now + chrono::Duration::seconds(900);
    enqueue(
        &pool,
        &NewJob {
            job_name: "process_activity_session".to_string(),
            payload: "sf-1".to_string(),
            idempotency_key: key.to_string(),
            run_at: later,
        },
    )
    .await
    .unwrap();

    let due = activity_db::claim_due_jobs(&pool, now, 10).await.unwrap();
    assert!(due.is_empty(), "job should have been postponed past `now`");

    let due_later = activity_db::claim_due_jobs(&pool, later, 10).await.unwrap();
    assert_eq!(due_later.len(), 1);
    complete_job(&pool, due_later[0].id).await.unwrap();

    Ok(())
}
