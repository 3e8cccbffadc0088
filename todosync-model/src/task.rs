//! Task entity and payload types for `Todosync`.
//!
//! A [`Task`] is owned by exactly one user and lives in the backend document
//! collection; the backend assigns its identity and its timestamps. Writes
//! go through [`TaskDraft`] (creation) and [`TaskPatch`] (sparse updates) —
//! both serialize with absent optional fields omitted entirely, so a patch
//! never clears a field it does not mention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationError;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 120;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Unique identifier for a task, assigned by the backend on creation and
/// immutable thereafter. UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task priority, stored in documents as its ordinal value.
///
/// Exactly three ordinals are valid: High=1, Medium=2, Low=3. Lower
/// ordinals sort first in the display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    /// Most urgent (ordinal 1).
    High,
    /// Default urgency (ordinal 2).
    Medium,
    /// Least urgent (ordinal 3).
    Low,
}

impl Priority {
    /// Returns the stored ordinal value (1, 2, or 3).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Converts a stored ordinal back into a priority, if valid.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Self::High),
            2 => Some(Self::Medium),
            3 => Some(Self::Low),
            _ => None,
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.ordinal()
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal).ok_or(ValidationError::InvalidPriority(ordinal))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// A task record as materialized from the backend document collection.
///
/// The backend exclusively owns the durable record; clients hold transient,
/// replaceable copies delivered by subscription snapshots. Archived tasks
/// are excluded from every listing but never physically removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Backend-assigned identity, immutable after creation.
    pub id: TaskId,
    /// Owning user; set at creation, never transferred.
    pub owner_id: crate::user::UserId,
    /// Non-empty title, at most [`MAX_TITLE_LENGTH`] characters.
    pub title: String,
    /// Optional free-form description, at most [`MAX_DESCRIPTION_LENGTH`] characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority ordinal (High=1, Medium=2, Low=3).
    pub priority: Priority,
    /// Display-ordered tags.
    pub tags: Vec<String>,
    /// Due date, normalized to UTC at the adapter boundary.
    pub due_date: DateTime<Utc>,
    /// Completion flag.
    pub is_done: bool,
    /// URL of an externally stored image attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Soft-delete flag. Once set there is no un-archive operation.
    pub archived: bool,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-assigned timestamp, refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new task.
///
/// `title`, `priority`, `tags`, and `due_date` are required; `description`
/// and `image_url` are optional and omitted from the serialized document
/// when absent (absent, not null).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority ordinal.
    pub priority: Priority,
    /// Display-ordered tags.
    pub tags: Vec<String>,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// Optional image attachment URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Sparse update payload: only fields that are `Some` are written.
///
/// Serializes to a document patch containing exactly the present fields,
/// so omitted fields are left untouched rather than cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New priority, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New tag list, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// New due date, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// New completion flag, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    /// New image URL, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl TaskPatch {
    /// Returns `true` when the patch carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
            && self.is_done.is_none()
            && self.image_url.is_none()
    }
}
