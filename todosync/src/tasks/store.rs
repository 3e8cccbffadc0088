//! Typed adapter over the backend document collection.
//!
//! Translates between domain types and document field maps: drafts and
//! patches are flattened to sparse field sets on the way in, documents are
//! decoded into [`Task`] values on the way out. Due dates are normalized
//! to UTC RFC 3339 here, at the boundary, so every stored record carries a
//! uniform representation regardless of what the caller held.
//!
//! Archiving is the only form of deletion: it flips the `archived` flag
//! and the record drops out of every subscription, but stays queryable.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use todosync_backend::documents::{
    Document, DocumentCollection, Fields, Filter, StoreError, WatchHandle,
};
use todosync_model::task::{Task, TaskDraft, TaskId, TaskPatch};
use todosync_model::user::UserId;

/// Typed task persistence over a [`DocumentCollection`].
#[derive(Clone)]
pub struct TaskStore {
    collection: Arc<DocumentCollection>,
}

impl TaskStore {
    /// Creates a store over the given collection.
    #[must_use]
    pub fn new(collection: Arc<DocumentCollection>) -> Self {
        Self { collection }
    }

    /// Persists a new task for `owner` and returns its backend-assigned id.
    ///
    /// Absent optional fields are omitted from the document entirely; the
    /// backend stamps `created_at` and `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write is rejected.
    pub async fn create(&self, owner: &UserId, draft: &TaskDraft) -> Result<TaskId, StoreError> {
        let id = self.collection.create(draft_fields(owner, draft)).await?;
        id.parse()
            .map_err(|e: uuid::Error| StoreError::MalformedDocument {
                id,
                reason: e.to_string(),
            })
    }

    /// Applies a sparse update: only the fields present in `patch` are
    /// written, everything else is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StoreError> {
        self.collection
            .patch(&id.to_string(), patch_fields(patch))
            .await
    }

    /// Archives a task. Idempotent: archiving an already archived task
    /// succeeds and leaves it archived.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub async fn archive(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut fields = Fields::new();
        fields.insert("archived".to_string(), Value::Bool(true));
        self.collection.patch(&id.to_string(), fields).await
    }

    /// Sets the completion flag without touching any other field.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub async fn set_completion(&self, id: &TaskId, done: bool) -> Result<(), StoreError> {
        let mut fields = Fields::new();
        fields.insert("is_done".to_string(), Value::Bool(done));
        self.collection.patch(&id.to_string(), fields).await
    }

    /// Fetches a single task by id, archived or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::MalformedDocument`] when the record cannot be decoded.
    pub async fn get(&self, id: &TaskId) -> Result<Task, StoreError> {
        let key = id.to_string();
        let document = self
            .collection
            .get(&key)
            .await
            .ok_or(StoreError::NotFound(key))?;
        decode_task(document)
    }

    /// Returns the owner's archived tasks. Archived records never appear
    /// in subscription snapshots but remain queryable here.
    pub async fn archived(&self, owner: &UserId) -> Vec<Task> {
        let filter = Filter::new()
            .where_eq("owner_id", owner.as_str())
            .where_eq("archived", true);
        decode_all(self.collection.query(&filter).await)
    }

    /// Opens a live subscription to the owner's unarchived tasks.
    ///
    /// The feed immediately yields the current snapshot, then a fresh full
    /// snapshot after every relevant write, in write order. Cancel through
    /// the returned [`Subscription`]; cancelling twice is a no-op.
    pub async fn subscribe(&self, owner: &UserId) -> (Subscription, TaskFeed) {
        let filter = Filter::new()
            .where_eq("owner_id", owner.as_str())
            .where_eq("archived", false);
        let (handle, rx) = self.collection.watch(filter).await;
        (Subscription { handle }, TaskFeed { rx })
    }
}

/// Handle that terminates a task subscription.
pub struct Subscription {
    handle: WatchHandle,
}

impl Subscription {
    /// Terminates the feed. Safe to call more than once.
    pub async fn cancel(&self) {
        self.handle.cancel().await;
    }

    /// Returns `true` while the subscription has not been cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

/// Receiving side of a task subscription: full snapshots, in write order.
pub struct TaskFeed {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
}

impl TaskFeed {
    /// Receives the next full snapshot, or `None` once the subscription
    /// has been cancelled.
    pub async fn recv(&mut self) -> Option<Vec<Task>> {
        self.rx.recv().await.map(decode_all)
    }
}

fn draft_fields(owner: &UserId, draft: &TaskDraft) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        "owner_id".to_string(),
        Value::String(owner.as_str().to_string()),
    );
    fields.insert("title".to_string(), Value::String(draft.title.clone()));
    if let Some(description) = &draft.description {
        fields.insert(
            "description".to_string(),
            Value::String(description.clone()),
        );
    }
    fields.insert(
        "priority".to_string(),
        Value::from(draft.priority.ordinal()),
    );
    fields.insert(
        "tags".to_string(),
        Value::Array(draft.tags.iter().cloned().map(Value::String).collect()),
    );
    fields.insert(
        "due_date".to_string(),
        Value::String(draft.due_date.to_rfc3339()),
    );
    fields.insert("is_done".to_string(), Value::Bool(false));
    if let Some(url) = &draft.image_url {
        fields.insert("image_url".to_string(), Value::String(url.clone()));
    }
    fields.insert("archived".to_string(), Value::Bool(false));
    fields
}

fn patch_fields(patch: &TaskPatch) -> Fields {
    let mut fields = Fields::new();
    if let Some(title) = &patch.title {
        fields.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(description) = &patch.description {
        fields.insert(
            "description".to_string(),
            Value::String(description.clone()),
        );
    }
    if let Some(priority) = patch.priority {
        fields.insert("priority".to_string(), Value::from(priority.ordinal()));
    }
    if let Some(tags) = &patch.tags {
        fields.insert(
            "tags".to_string(),
            Value::Array(tags.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(due_date) = patch.due_date {
        fields.insert("due_date".to_string(), Value::String(due_date.to_rfc3339()));
    }
    if let Some(is_done) = patch.is_done {
        fields.insert("is_done".to_string(), Value::Bool(is_done));
    }
    if let Some(url) = &patch.image_url {
        fields.insert("image_url".to_string(), Value::String(url.clone()));
    }
    fields
}

fn decode_task(document: Document) -> Result<Task, StoreError> {
    let Document { id, mut fields } = document;
    fields.insert("id".to_string(), Value::String(id.clone()));
    serde_json::from_value(Value::Object(fields)).map_err(|e| StoreError::MalformedDocument {
        id,
        reason: e.to_string(),
    })
}

/// Decodes a snapshot, skipping records that fail to decode rather than
/// poisoning the whole feed.
fn decode_all(documents: Vec<Document>) -> Vec<Task> {
    documents
        .into_iter()
        .filter_map(|document| match decode_task(document) {
            Ok(task) => Some(task),
            Err(error) => {
                warn!(%error, "skipping undecodable task record");
                None
            }
        })
        .collect()
}
