//! Task list synchronization controller.
//!
//! Owns at most one live subscription at a time and publishes immutable
//! [`TaskListSnapshot`] values through a watch channel. Every backend push
//! replaces the list wholesale — no local diffing, no optimistic edits:
//! the rendered list is always exactly what the backend last confirmed.
//!
//! Mutations validate locally, then write through the store and let the
//! subscription deliver the result. A failed operation records its message
//! in the snapshot and returns the error; nothing is retried. The message
//! stays put across later pushes until [`TaskListController::clear_error`]
//! or a fresh [`TaskListController::start`].

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use todosync_model::task::{Task, TaskDraft, TaskId, TaskPatch};
use todosync_model::user::UserId;
use todosync_model::validation::{validate_draft, validate_patch};

use crate::attachments::Attachments;
use crate::tasks::{TaskError, ordering, store::Subscription, store::TaskStore};

/// Synchronization lifecycle of the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPhase {
    /// No subscription; the list is empty and inert.
    #[default]
    Idle,
    /// Subscription requested, first snapshot not yet delivered.
    Subscribing,
    /// Live: the list mirrors the backend's last confirmed state.
    Active,
}

/// Immutable view of the task list handed to observers.
///
/// Cloning is cheap; the task slice is shared, never mutated in place.
#[derive(Debug, Clone)]
pub struct TaskListSnapshot {
    /// Current synchronization phase.
    pub phase: SyncPhase,
    /// Tasks in display order.
    pub tasks: Arc<[Task]>,
    /// Message of the most recent failed operation, if not yet cleared.
    pub error: Option<String>,
}

impl Default for TaskListSnapshot {
    fn default() -> Self {
        Self {
            phase: SyncPhase::Idle,
            tasks: Vec::new().into(),
            error: None,
        }
    }
}

struct ActiveSync {
    subscription: Subscription,
    pump: JoinHandle<()>,
}

/// Controller coordinating the store, validation, and snapshot publishing.
pub struct TaskListController {
    store: TaskStore,
    attachments: Attachments,
    state: Arc<watch::Sender<TaskListSnapshot>>,
    active: Mutex<Option<ActiveSync>>,
}

impl TaskListController {
    /// Creates an idle controller over the given store and attachment
    /// client.
    #[must_use]
    pub fn new(store: TaskStore, attachments: Attachments) -> Self {
        let (state, _) = watch::channel(TaskListSnapshot::default());
        Self {
            store,
            attachments,
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    /// Subscribes to snapshot changes. The receiver's current value is the
    /// present snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskListSnapshot> {
        self.state.subscribe()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TaskListSnapshot {
        self.state.borrow().clone()
    }

    /// Starts synchronizing `owner`'s tasks.
    ///
    /// Any previous subscription is terminated first; the controller holds
    /// at most one. The phase moves to `Subscribing` immediately and to
    /// `Active` when the initial snapshot arrives.
    pub async fn start(&self, owner: &UserId) {
        self.stop().await;

        info!(owner = %owner, "starting task sync");
        self.state.send_replace(TaskListSnapshot {
            phase: SyncPhase::Subscribing,
            tasks: Vec::new().into(),
            error: None,
        });

        let (subscription, mut feed) = self.store.subscribe(owner).await;
        let state = Arc::clone(&self.state);
        let pump = tokio::spawn(async move {
            while let Some(mut tasks) = feed.recv().await {
                ordering::sort_for_display(&mut tasks);
                // Unrelated pushes must not wipe a recorded failure; the
                // error survives until cleared or the sync restarts.
                state.send_modify(|snapshot| {
                    snapshot.phase = SyncPhase::Active;
                    snapshot.tasks = tasks.into();
                });
            }
            debug!("task feed closed");
        });

        *self.active.lock().await = Some(ActiveSync { subscription, pump });
    }

    /// Stops synchronizing and resets the snapshot to idle and empty.
    /// A no-op when already idle, so sign-out from any state is safe.
    pub async fn stop(&self) {
        let Some(active) = self.active.lock().await.take() else {
            return;
        };
        info!("stopping task sync");
        active.subscription.cancel().await;
        active.pump.abort();
        self.state.send_replace(TaskListSnapshot::default());
    }

    /// Validates and persists a new task for `owner`, returning its id.
    ///
    /// The task appears in the snapshot only once the backend pushes it
    /// back; there is no optimistic insertion.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] on validation or persistence failure; the
    /// message is also recorded in the snapshot.
    pub async fn add_task(&self, owner: &UserId, draft: TaskDraft) -> Result<TaskId, TaskError> {
        if let Err(e) = validate_draft(&draft) {
            return Err(self.fail(e.into()));
        }
        match self.store.create(owner, &draft).await {
            Ok(id) => {
                info!(task = %id, "task created");
                Ok(id)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Like [`add_task`](Self::add_task), with an optional image to attach.
    ///
    /// The image is uploaded first and its URL stored on the task. An
    /// upload failure is logged and the task is saved without an image;
    /// only validation or persistence failures abort the operation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] on validation or persistence failure. Upload
    /// failures alone never produce an error.
    pub async fn add_task_with_image(
        &self,
        owner: &UserId,
        mut draft: TaskDraft,
        image: Option<&[u8]>,
    ) -> Result<TaskId, TaskError> {
        if let Some(bytes) = image {
            match self.attachments.upload(owner, bytes, None).await {
                Ok(url) => draft.image_url = Some(url),
                Err(error) => {
                    warn!(%error, "image upload failed, saving task without image");
                    draft.image_url = None;
                }
            }
        }
        self.add_task(owner, draft).await
    }

    /// Validates and applies a sparse update. Fields absent from the patch
    /// are untouched; an entirely empty patch is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] on validation or persistence failure.
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), TaskError> {
        if let Err(e) = validate_patch(patch) {
            return Err(self.fail(e.into()));
        }
        self.store
            .update(id, patch)
            .await
            .map_err(|e| self.fail(e.into()))
    }

    /// Archives a task; it drops out of the snapshot on the next push.
    /// Idempotent for an already archived task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] for an unknown id.
    pub async fn archive_task(&self, id: &TaskId) -> Result<(), TaskError> {
        self.store
            .archive(id)
            .await
            .map_err(|e| self.fail(e.into()))
    }

    /// Toggles completion without touching any other field.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] for an unknown id.
    pub async fn set_completion(&self, id: &TaskId, done: bool) -> Result<(), TaskError> {
        self.store
            .set_completion(id, done)
            .await
            .map_err(|e| self.fail(e.into()))
    }

    /// Clears the recorded error message, leaving phase and tasks intact.
    pub fn clear_error(&self) {
        self.state.send_modify(|snapshot| snapshot.error = None);
    }

    /// Records a failed operation in the snapshot and passes the error on.
    fn fail(&self, error: TaskError) -> TaskError {
        error!(%error, "task operation failed");
        self.state
            .send_modify(|snapshot| snapshot.error = Some(error.to_string()));
        error
    }
}
