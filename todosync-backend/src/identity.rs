//! Identity provider with a three-state session lifecycle.
//!
//! Stand-in for a managed email/password identity service. The session is
//! published through a [`watch`] channel and starts in
//! [`SessionState::Unknown`]; observers receive a definitive
//! `Anonymous`/`Authenticated` value only after [`IdentityProvider::resolve`]
//! or a successful sign-in. Credentials are stored salted and digested,
//! never in the clear, even in this in-process form.

use std::collections::HashMap;

use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use todosync_model::user::{SessionState, UserId, UserProfile};

/// Minimum password length the provider enforces at registration.
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Errors raised by the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailAlreadyInUse,
    /// Email or password did not match any account.
    ///
    /// Deliberately does not reveal which of the two was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// The password does not meet the provider's minimum length.
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),
    /// No account exists for this email.
    #[error("no account for this email")]
    UserNotFound,
    /// The operation requires a signed-in session.
    #[error("not signed in")]
    NotSignedIn,
}

struct UserRecord {
    profile: UserProfile,
    salt: [u8; 16],
    digest: [u8; 32],
}

/// In-memory email/password identity provider.
pub struct IdentityProvider {
    users: RwLock<HashMap<String, UserRecord>>,
    session: watch::Sender<SessionState>,
    min_password_length: usize,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider {
    /// Creates a provider with no accounts and an unresolved session.
    #[must_use]
    pub fn new() -> Self {
        Self::with_min_password_length(DEFAULT_MIN_PASSWORD_LENGTH)
    }

    /// Creates a provider enforcing the given minimum password length.
    #[must_use]
    pub fn with_min_password_length(min_password_length: usize) -> Self {
        let (session, _) = watch::channel(SessionState::Unknown);
        Self {
            users: RwLock::new(HashMap::new()),
            session,
            min_password_length,
        }
    }

    /// Subscribes to session changes. The receiver's current value is the
    /// present session state; every transition is published.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.session.borrow().clone()
    }

    /// Resolves the initial session: with no persisted credentials the
    /// outcome is `Anonymous`. A no-op once the session is resolved.
    pub fn resolve(&self) {
        self.session.send_if_modified(|state| {
            if state.is_unknown() {
                *state = SessionState::Anonymous;
                true
            } else {
                false
            }
        });
    }

    /// Registers a new account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::WeakPassword`] for a too-short password and
    /// [`IdentityError::EmailAlreadyInUse`] for a duplicate email.
    pub async fn register(&self, email: &str, password: &str) -> Result<UserProfile, IdentityError> {
        if password.chars().count() < self.min_password_length {
            return Err(IdentityError::WeakPassword(self.min_password_length));
        }

        let key = email.to_ascii_lowercase();
        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let salt: [u8; 16] = rand::rng().random();
        let profile = UserProfile {
            user_id: UserId::new(uuid::Uuid::now_v7().to_string()),
            email: email.to_string(),
            display_name: None,
        };
        users.insert(
            key,
            UserRecord {
                profile: profile.clone(),
                salt,
                digest: digest_password(&salt, password),
            },
        );
        drop(users);

        info!(user = %profile.user_id, "account registered");
        self.session
            .send_replace(SessionState::Authenticated(profile.clone()));
        Ok(profile)
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] when the pair does not
    /// match an account.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, IdentityError> {
        let users = self.users.read().await;
        let record = users
            .get(&email.to_ascii_lowercase())
            .ok_or(IdentityError::InvalidCredentials)?;
        if digest_password(&record.salt, password) != record.digest {
            return Err(IdentityError::InvalidCredentials);
        }
        let profile = record.profile.clone();
        drop(users);

        info!(user = %profile.user_id, "signed in");
        self.session
            .send_replace(SessionState::Authenticated(profile.clone()));
        Ok(profile)
    }

    /// Signs out. Idempotent: signing out while already anonymous (or
    /// unresolved) settles the session at `Anonymous` without error.
    pub fn sign_out(&self) {
        debug!("signed out");
        self.session.send_replace(SessionState::Anonymous);
    }

    /// Issues a password-reset for the account, if it exists.
    ///
    /// Nothing is actually delivered in this in-process form; the call
    /// validates that the account exists.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] for an unknown email.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let users = self.users.read().await;
        if users.contains_key(&email.to_ascii_lowercase()) {
            info!(email, "password reset issued");
            Ok(())
        } else {
            Err(IdentityError::UserNotFound)
        }
    }

    /// Updates the signed-in user's display name, in the account record
    /// and in the published session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotSignedIn`] without an active session.
    pub async fn update_display_name(&self, name: &str) -> Result<UserProfile, IdentityError> {
        let current = self.current();
        let Some(profile) = current.user() else {
            return Err(IdentityError::NotSignedIn);
        };

        let mut users = self.users.write().await;
        let record = users
            .get_mut(&profile.email.to_ascii_lowercase())
            .ok_or(IdentityError::NotSignedIn)?;
        record.profile.display_name = Some(name.to_string());
        let updated = record.profile.clone();
        drop(users);

        self.session
            .send_replace(SessionState::Authenticated(updated.clone()));
        Ok(updated)
    }
}

fn digest_password(salt: &[u8; 16], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
