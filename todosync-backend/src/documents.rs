//! Document collection with live filtered subscriptions.
//!
//! Documents are JSON field maps keyed by a backend-generated opaque id.
//! Writes are single-document patches; queries are conjunctions of equality
//! filters. A [`DocumentCollection::watch`] subscription receives the
//! *complete current snapshot* of matching documents — an immediate initial
//! snapshot, then one push per acknowledged write whose matching set
//! changed, in FIFO order per subscription. A write that removes a document
//! from a subscription's matching set (for example flipping an `archived`
//! flag) also triggers a push, so the subscriber sees the shrunken set.
//!
//! Entries are ephemeral — the collection lives only as long as the
//! process, same as the rest of this backend stand-in.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, mpsc};

/// Default maximum number of documents the collection will hold.
const DEFAULT_MAX_DOCUMENTS: usize = 10_000;

/// A document's field map.
pub type Fields = Map<String, Value>;

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),
    /// The collection has reached its maximum capacity.
    #[error("collection is full (max {0} documents)")]
    CapacityReached(usize),
    /// A stored document could not be decoded into its domain type.
    #[error("malformed document {id}: {reason}")]
    MalformedDocument {
        /// Identity of the offending document.
        id: String,
        /// Human-readable decode failure.
        reason: String,
    },
}

/// A document as returned by queries and snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Backend-assigned identity, unique and never reused.
    pub id: String,
    /// The document's field map.
    pub fields: Fields,
}

impl Document {
    /// Returns a field value by key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// A conjunction of equality predicates over document fields.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Creates an empty filter (matches everything).
    #[must_use]
    pub const fn new() -> Self {
        Self { clauses: Vec::new() }
    }

    /// Adds an equality predicate on `key`.
    #[must_use]
    pub fn where_eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((key.into(), value.into()));
        self
    }

    /// Returns `true` when every predicate holds for the given fields.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        self.clauses
            .iter()
            .all(|(key, value)| fields.get(key) == Some(value))
    }
}

/// A registered live query.
struct Watcher {
    filter: Filter,
    tx: mpsc::UnboundedSender<Vec<Document>>,
    active: Arc<AtomicBool>,
}

struct Inner {
    documents: BTreeMap<String, Fields>,
    watchers: HashMap<u64, Watcher>,
}

/// In-memory document collection with push-based live queries.
///
/// Thread-safe via [`RwLock`]. Server-side concerns live here: id
/// assignment, `created_at`/`updated_at` stamping, and snapshot pushes.
pub struct DocumentCollection {
    inner: RwLock<Inner>,
    max_documents: usize,
    next_watch_id: AtomicU64,
}

impl Default for DocumentCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCollection {
    /// Creates a new, empty collection with the default capacity limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_DOCUMENTS)
    }

    /// Creates a new, empty collection holding at most `max_documents`.
    #[must_use]
    pub fn with_capacity(max_documents: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                documents: BTreeMap::new(),
                watchers: HashMap::new(),
            }),
            max_documents,
            next_watch_id: AtomicU64::new(0),
        }
    }

    /// Creates a document, assigning a fresh id and stamping
    /// `created_at`/`updated_at`, and returns the new id.
    ///
    /// The write is durable (within this process) before the call resolves,
    /// and triggers exactly one push to every subscription whose filter
    /// matches the new document — including the caller's own subscription.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CapacityReached`] when the collection is full.
    pub async fn create(&self, mut fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.documents.len() >= self.max_documents {
            return Err(StoreError::CapacityReached(self.max_documents));
        }

        let id = uuid::Uuid::now_v7().to_string();
        let stamp = timestamp_value();
        fields.insert("created_at".to_string(), stamp.clone());
        fields.insert("updated_at".to_string(), stamp);
        inner.documents.insert(id.clone(), fields);

        Self::push_snapshots(&mut inner, &id, &HashMap::new());
        Ok(id)
    }

    /// Applies a sparse patch: only the supplied keys are written, all
    /// other fields are left untouched. Always refreshes `updated_at`,
    /// even for an empty patch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when `id` does not exist.
    pub async fn patch(&self, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.documents.get(id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        // Matching state before the merge, per watcher, so pushes also go
        // to subscriptions the document is about to leave.
        let matched_before: HashMap<u64, bool> = inner
            .watchers
            .iter()
            .map(|(watch_id, watcher)| (*watch_id, watcher.filter.matches(existing)))
            .collect();

        if let Some(document) = inner.documents.get_mut(id) {
            for (key, value) in fields {
                document.insert(key, value);
            }
            document.insert("updated_at".to_string(), timestamp_value());
        }

        Self::push_snapshots(&mut inner, id, &matched_before);
        Ok(())
    }

    /// Returns a single document by id.
    pub async fn get(&self, id: &str) -> Option<Document> {
        let inner = self.inner.read().await;
        inner.documents.get(id).map(|fields| Document {
            id: id.to_string(),
            fields: fields.clone(),
        })
    }

    /// Returns all documents matching the filter, ordered by id.
    pub async fn query(&self, filter: &Filter) -> Vec<Document> {
        let inner = self.inner.read().await;
        Self::snapshot_for(&inner, filter)
    }

    /// Returns the total number of documents, archived ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Returns `true` when the collection holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }

    /// Opens a live query: the receiver immediately gets the current
    /// snapshot of matching documents, then a fresh full snapshot after
    /// every write that changes the matching set.
    ///
    /// Snapshots per subscription arrive in the order the writes were
    /// acknowledged. The returned [`WatchHandle`] terminates the feed;
    /// cancelling twice is a no-op after the first.
    pub async fn watch(
        self: &Arc<Self>,
        filter: Filter,
    ) -> (WatchHandle, mpsc::UnboundedReceiver<Vec<Document>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let watch_id = self.next_watch_id.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.write().await;
        let initial = Self::snapshot_for(&inner, &filter);
        // The receiver is alive here, so the initial send cannot fail.
        let _ = tx.send(initial);
        inner.watchers.insert(
            watch_id,
            Watcher {
                filter,
                tx,
                active: Arc::clone(&active),
            },
        );
        drop(inner);

        let handle = WatchHandle {
            id: watch_id,
            collection: Arc::downgrade(self),
            active,
        };
        (handle, rx)
    }

    fn snapshot_for(inner: &Inner, filter: &Filter) -> Vec<Document> {
        inner
            .documents
            .iter()
            .filter(|(_, fields)| filter.matches(fields))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect()
    }

    /// Pushes fresh snapshots to every watcher whose matching set changed
    /// with the write to `changed_id`, pruning dead watchers as it goes.
    fn push_snapshots(inner: &mut Inner, changed_id: &str, matched_before: &HashMap<u64, bool>) {
        let changed: Option<Fields> = inner.documents.get(changed_id).cloned();
        let watch_ids: Vec<u64> = inner.watchers.keys().copied().collect();
        let mut dead = Vec::new();

        for watch_id in watch_ids {
            let Some(watcher) = inner.watchers.get(&watch_id) else {
                continue;
            };
            if !watcher.active.load(Ordering::SeqCst) {
                dead.push(watch_id);
                continue;
            }
            let before = matched_before.get(&watch_id).copied().unwrap_or(false);
            let after = changed
                .as_ref()
                .is_some_and(|fields| watcher.filter.matches(fields));
            if !before && !after {
                continue;
            }
            let snapshot = Self::snapshot_for(inner, &watcher.filter);
            if inner.watchers[&watch_id].tx.send(snapshot).is_err() {
                dead.push(watch_id);
            }
        }

        for watch_id in dead {
            inner.watchers.remove(&watch_id);
        }
    }
}

/// Handle that terminates a live query and releases its resources.
///
/// [`cancel`](WatchHandle::cancel) is idempotent; dropping the handle
/// without cancelling deactivates the feed on the next write.
pub struct WatchHandle {
    id: u64,
    collection: Weak<DocumentCollection>,
    active: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Terminates the feed. The subscription's channel closes and no
    /// further snapshots are delivered. Calling this more than once is a
    /// no-op after the first.
    pub async fn cancel(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(collection) = self.collection.upgrade() {
            collection.inner.write().await.watchers.remove(&self.id);
        }
    }

    /// Returns `true` while the feed has not been cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        // Best effort: mark inactive so the next write prunes the watcher.
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Server-side timestamp as stored in documents (RFC 3339).
fn timestamp_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}
