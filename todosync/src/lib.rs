//! Client core for `Todosync` — a real-time personal task list.
//!
//! The backend owns every durable record; this crate holds the typed
//! adapters and state machines in front of it:
//!
//! - [`tasks`] — store adapter, display ordering, and the list controller
//!   that publishes immutable snapshots;
//! - [`auth`] — credential validation and the session lifecycle;
//! - [`attachments`] — image uploads referenced from tasks by URL;
//! - [`config`] — layered CLI/env/file configuration.

pub mod attachments;
pub mod auth;
pub mod config;
pub mod tasks;
