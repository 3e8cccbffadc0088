//! Task list synchronization: store adapter, display ordering, and the
//! list controller.
//!
//! The [`store::TaskStore`] is the only component that touches the backend
//! document collection; the [`controller::TaskListController`] composes it
//! with validation and publishes immutable list snapshots; [`ordering`]
//! holds the display comparator applied to every snapshot.

pub mod controller;
pub mod ordering;
pub mod store;

pub use controller::{SyncPhase, TaskListController, TaskListSnapshot};
pub use store::{Subscription, TaskFeed, TaskStore};

use todosync_backend::documents::StoreError;
use todosync_model::validation::ValidationError;

/// Errors surfaced by task operations: either the input was rejected
/// locally, or the backend write failed.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Input rejected before any backend call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The backend rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}
