//! Integration tests for sparse updates: untouched fields are preserved,
//! minimal creates omit optional fields, and due dates are stored in a
//! normalized form.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone, Utc};

use todosync::tasks::TaskStore;
use todosync_backend::documents::{DocumentCollection, StoreError};
use todosync_model::task::{Priority, TaskDraft, TaskId, TaskPatch};
use todosync_model::user::UserId;

fn harness() -> (Arc<DocumentCollection>, TaskStore) {
    let collection = Arc::new(DocumentCollection::new());
    let store = TaskStore::new(Arc::clone(&collection));
    (collection, store)
}

fn full_draft() -> TaskDraft {
    TaskDraft {
        title: "Write report".to_string(),
        description: Some("quarterly numbers".to_string()),
        priority: Priority::High,
        tags: vec!["work".to_string(), "urgent".to_string()],
        due_date: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        image_url: Some("mem://images/alice/todo_image_1717232400000_ab12cd34.jpg".to_string()),
    }
}

#[tokio::test]
async fn patching_one_field_preserves_the_rest() {
    let (_, store) = harness();
    let owner = UserId::new("alice");
    let id = store.create(&owner, &full_draft()).await.unwrap();

    let patch = TaskPatch {
        title: Some("Write the report".to_string()),
        ..TaskPatch::default()
    };
    store.update(&id, &patch).await.unwrap();

    let task = store.get(&id).await.unwrap();
    assert_eq!(task.title, "Write the report");
    assert_eq!(task.description.as_deref(), Some("quarterly numbers"));
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.tags, ["work", "urgent"]);
    assert_eq!(
        task.image_url.as_deref(),
        Some("mem://images/alice/todo_image_1717232400000_ab12cd34.jpg")
    );
    assert!(!task.is_done);
}

#[tokio::test]
async fn patch_refreshes_updated_at_but_not_created_at() {
    let (_, store) = harness();
    let owner = UserId::new("alice");
    let id = store.create(&owner, &full_draft()).await.unwrap();
    let before = store.get(&id).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let patch = TaskPatch {
        priority: Some(Priority::Low),
        ..TaskPatch::default()
    };
    store.update(&id, &patch).await.unwrap();

    let after = store.get(&id).await.unwrap();
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn minimal_create_leaves_optionals_absent() {
    let (collection, store) = harness();
    let owner = UserId::new("alice");
    let draft = TaskDraft {
        title: "Buy milk".to_string(),
        description: None,
        priority: Priority::Medium,
        tags: vec![],
        due_date: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        image_url: None,
    };
    let id = store.create(&owner, &draft).await.unwrap();

    // Absent means absent in the stored document, not null.
    let document = collection.get(&id.to_string()).await.unwrap();
    assert!(!document.fields.contains_key("description"));
    assert!(!document.fields.contains_key("image_url"));

    let task = store.get(&id).await.unwrap();
    assert_eq!(task.description, None);
    assert_eq!(task.image_url, None);
}

#[tokio::test]
async fn due_date_is_stored_normalized_to_utc() {
    let (collection, store) = harness();
    let owner = UserId::new("alice");
    let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap(); // +05:30
    let local = offset.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    let mut draft = full_draft();
    draft.due_date = local.with_timezone(&Utc);
    let id = store.create(&owner, &draft).await.unwrap();

    let document = collection.get(&id.to_string()).await.unwrap();
    assert_eq!(
        document.fields["due_date"],
        serde_json::json!("2024-06-01T03:30:00+00:00")
    );
    assert_eq!(store.get(&id).await.unwrap().due_date, local);
}

#[tokio::test]
async fn patching_due_date_renormalizes() {
    let (collection, store) = harness();
    let owner = UserId::new("alice");
    let id = store.create(&owner, &full_draft()).await.unwrap();

    let patch = TaskPatch {
        due_date: Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
        ..TaskPatch::default()
    };
    store.update(&id, &patch).await.unwrap();

    let document = collection.get(&id.to_string()).await.unwrap();
    assert_eq!(
        document.fields["due_date"],
        serde_json::json!("2025-01-02T00:00:00+00:00")
    );
}

#[tokio::test]
async fn update_of_unknown_task_is_not_found() {
    let (_, store) = harness();
    let patch = TaskPatch {
        title: Some("x".to_string()),
        ..TaskPatch::default()
    };
    let result = store.update(&TaskId::new(), &patch).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
