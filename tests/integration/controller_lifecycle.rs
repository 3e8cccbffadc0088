//! Integration tests for the task list controller: phase transitions,
//! wholesale snapshot replacement, error recording, and the
//! one-subscription-at-a-time rule.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use todosync::attachments::Attachments;
use todosync::tasks::{SyncPhase, TaskError, TaskListController, TaskStore};
use todosync_backend::documents::DocumentCollection;
use todosync_backend::objects::ObjectStore;
use todosync_model::task::{Priority, TaskDraft, TaskPatch};
use todosync_model::user::UserId;
use todosync_model::validation::ValidationError;

fn controller_with_capacity(max_documents: usize) -> TaskListController {
    let collection = Arc::new(DocumentCollection::with_capacity(max_documents));
    TaskListController::new(
        TaskStore::new(collection),
        Attachments::new(Arc::new(ObjectStore::new())),
    )
}

fn controller() -> TaskListController {
    controller_with_capacity(10_000)
}

fn draft(title: &str, priority: Priority) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: None,
        priority,
        tags: vec![],
        due_date: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        image_url: None,
    }
}

#[tokio::test]
async fn starts_idle_with_empty_list() {
    let controller = controller();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SyncPhase::Idle);
    assert!(snapshot.tasks.is_empty());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn start_moves_through_subscribing_to_active() {
    let controller = controller();
    let mut state = controller.subscribe();

    controller.start(&UserId::new("alice")).await;
    // Subscribing is published synchronously by start; the pump then
    // flips to Active on the initial snapshot.
    let _ = state
        .wait_for(|s| s.phase == SyncPhase::Active)
        .await
        .unwrap();
    assert!(controller.snapshot().tasks.is_empty());
}

#[tokio::test]
async fn snapshots_replace_the_list_wholesale_in_display_order() {
    let controller = controller();
    let owner = UserId::new("alice");
    let mut state = controller.subscribe();
    controller.start(&owner).await;

    controller
        .add_task(&owner, draft("low", Priority::Low))
        .await
        .unwrap();
    controller
        .add_task(&owner, draft("high", Priority::High))
        .await
        .unwrap();

    let snapshot = state.wait_for(|s| s.tasks.len() == 2).await.unwrap().clone();
    let titles: Vec<&str> = snapshot.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["high", "low"]);
}

#[tokio::test]
async fn mutations_are_never_applied_optimistically() {
    let controller = controller();
    let owner = UserId::new("alice");
    controller.start(&owner).await;
    let mut state = controller.subscribe();
    let _ = state
        .wait_for(|s| s.phase == SyncPhase::Active)
        .await
        .unwrap();

    let id = controller
        .add_task(&owner, draft("t", Priority::Medium))
        .await
        .unwrap();
    let _ = state.wait_for(|s| s.tasks.len() == 1).await.unwrap();

    controller.set_completion(&id, true).await.unwrap();
    // The change shows up only once the backend pushes it back.
    let snapshot = state
        .wait_for(|s| s.tasks.first().is_some_and(|t| t.is_done))
        .await
        .unwrap()
        .clone();
    assert!(snapshot.tasks[0].is_done);
}

#[tokio::test]
async fn stop_resets_to_idle_and_is_idempotent() {
    let controller = controller();
    let owner = UserId::new("alice");
    let mut state = controller.subscribe();
    controller.start(&owner).await;
    let _ = state
        .wait_for(|s| s.phase == SyncPhase::Active)
        .await
        .unwrap();

    controller.stop().await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SyncPhase::Idle);
    assert!(snapshot.tasks.is_empty());

    // Stopping again from idle must be a quiet no-op.
    controller.stop().await;
    assert_eq!(controller.snapshot().phase, SyncPhase::Idle);
}

#[tokio::test]
async fn restart_replaces_the_previous_subscription() {
    let controller = controller();
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");
    let mut state = controller.subscribe();

    controller.start(&alice).await;
    controller
        .add_task(&alice, draft("alice's", Priority::Medium))
        .await
        .unwrap();
    let _ = state.wait_for(|s| s.tasks.len() == 1).await.unwrap();

    // Switching owners tears down the first subscription.
    controller.start(&bob).await;
    controller
        .add_task(&bob, draft("bob's", Priority::Medium))
        .await
        .unwrap();
    let snapshot = state
        .wait_for(|s| s.tasks.first().is_some_and(|t| t.owner_id == bob))
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.phase, SyncPhase::Active);
    assert_eq!(snapshot.tasks.len(), 1);
    assert_eq!(snapshot.tasks[0].title, "bob's");
}

#[tokio::test]
async fn validation_failure_is_recorded_and_returned() {
    let controller = controller();
    let owner = UserId::new("alice");

    let result = controller.add_task(&owner, draft("", Priority::Medium)).await;
    assert!(matches!(
        result,
        Err(TaskError::Validation(ValidationError::TitleEmpty))
    ));
    assert!(controller.snapshot().error.is_some());
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let controller = controller();
    let owner = UserId::new("alice");
    let id = controller
        .add_task(&owner, draft("t", Priority::Medium))
        .await
        .unwrap();

    let result = controller.update_task(&id, &TaskPatch::default()).await;
    assert!(matches!(
        result,
        Err(TaskError::Validation(ValidationError::EmptyPatch))
    ));
}

#[tokio::test]
async fn recorded_error_survives_later_snapshots() {
    let controller = controller();
    let owner = UserId::new("alice");
    let mut state = controller.subscribe();
    controller.start(&owner).await;
    let _ = state
        .wait_for(|s| s.phase == SyncPhase::Active)
        .await
        .unwrap();

    // A write against an unknown id records a failure message.
    let patch = TaskPatch {
        title: Some("x".to_string()),
        ..TaskPatch::default()
    };
    let result = controller
        .update_task(&todosync_model::task::TaskId::new(), &patch)
        .await;
    assert!(matches!(result, Err(TaskError::Store(_))));
    assert!(controller.snapshot().error.is_some());

    // An unrelated successful write pushes a new snapshot; the message
    // must still be there for the view layer.
    controller
        .add_task(&owner, draft("later", Priority::Medium))
        .await
        .unwrap();
    let snapshot = state.wait_for(|s| s.tasks.len() == 1).await.unwrap().clone();
    assert!(snapshot.error.is_some());

    controller.clear_error();
    assert!(controller.snapshot().error.is_none());
}

#[tokio::test]
async fn persistence_failure_is_recorded_and_not_retried() {
    let controller = controller_with_capacity(0);
    let owner = UserId::new("alice");

    let result = controller
        .add_task(&owner, draft("t", Priority::Medium))
        .await;
    assert!(matches!(result, Err(TaskError::Store(_))));

    let snapshot = controller.snapshot();
    assert!(snapshot.error.is_some());
    // No retry: the collection stays empty and the error stays put until
    // cleared.
    assert!(snapshot.tasks.is_empty());

    controller.clear_error();
    assert!(controller.snapshot().error.is_none());
}
