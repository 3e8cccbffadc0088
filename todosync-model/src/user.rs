//! User identity and session types.
//!
//! The identity boundary supplies either an authenticated profile or
//! "no user", with an asynchronous loading phase before the first
//! definitive value is known. [`SessionState::Unknown`] models that
//! loading phase as a real third state — downstream components must never
//! conflate it with [`SessionState::Anonymous`].

use serde::{Deserialize, Serialize};

/// Opaque identity of an authenticated user, assigned by the identity
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The profile of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider-assigned identity.
    pub user_id: UserId,
    /// Sign-in email address.
    pub email: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Session lifecycle as observed from the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The provider has not yet resolved whether a session exists.
    #[default]
    Unknown,
    /// Definitively signed out.
    Anonymous,
    /// Signed in as the given user.
    Authenticated(UserProfile),
}

impl SessionState {
    /// Returns the authenticated profile, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            Self::Unknown | Self::Anonymous => None,
        }
    }

    /// Returns `true` while the provider is still resolving the session.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}
