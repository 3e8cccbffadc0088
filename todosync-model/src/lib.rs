//! Shared domain types for `Todosync`: the task entity, its create and
//! patch payloads, user identity and session types, and local validation.

pub mod task;
pub mod user;
pub mod validation;
