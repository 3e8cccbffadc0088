//! In-process managed-backend stand-in for `Todosync`.
//!
//! The production system delegates persistence, file storage, and
//! authentication to an external managed backend. This crate provides the
//! same three boundaries in-process so the client core, the tests, and the
//! demo binary can run against real push semantics:
//!
//! - [`documents`] — a document collection with equality-filtered live
//!   queries that push full snapshots on every matching change;
//! - [`objects`] — object storage with `upload`/`get_url`;
//! - [`identity`] — an identity provider with a three-state session
//!   lifecycle.

pub mod documents;
pub mod identity;
pub mod objects;
