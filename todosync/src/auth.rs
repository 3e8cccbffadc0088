//! Authentication client over the identity provider.
//!
//! Validates credentials locally before any provider call, then forwards
//! to the provider and republishes its session feed. The session starts
//! `Unknown` until [`AuthClient::resolve`] or a sign-in settles it; task
//! sync must not start while the session is unresolved.

use std::sync::Arc;

use tokio::sync::watch;

use todosync_backend::identity::{IdentityError, IdentityProvider};
use todosync_model::user::{SessionState, UserProfile};
use todosync_model::validation::{self, ValidationError};

/// Minimum password length enforced client-side, matching the provider's
/// own default.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors surfaced by authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials rejected before any provider call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The identity provider rejected the operation.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Client-side authentication facade.
#[derive(Clone)]
pub struct AuthClient {
    provider: Arc<IdentityProvider>,
}

impl AuthClient {
    /// Creates a client over the given identity provider.
    #[must_use]
    pub fn new(provider: Arc<IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Subscribes to session changes. The receiver's current value is the
    /// present session state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.provider.subscribe()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.provider.current()
    }

    /// Resolves the initial `Unknown` session into a definitive state.
    /// A no-op once resolved.
    pub fn resolve(&self) {
        self.provider.resolve();
    }

    /// Registers a new account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a malformed email, a short
    /// password, or a mismatched confirmation, and [`AuthError::Identity`]
    /// when the provider rejects the registration.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<UserProfile, AuthError> {
        validation::validate_email(email)?;
        validation::validate_password(password, MIN_PASSWORD_LENGTH)?;
        if password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        Ok(self.provider.register(email, password).await?)
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a malformed email and
    /// [`AuthError::Identity`] for credentials that do not match.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        validation::validate_email(email)?;
        Ok(self.provider.sign_in(email, password).await?)
    }

    /// Signs out. Idempotent from any session state.
    pub fn sign_out(&self) {
        self.provider.sign_out();
    }

    /// Requests a password reset for the account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a malformed email and
    /// [`AuthError::Identity`] for an unknown account.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        validation::validate_email(email)?;
        Ok(self.provider.send_password_reset(email).await?)
    }

    /// Updates the signed-in user's display name.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Identity`] without an active session.
    pub async fn update_display_name(&self, name: &str) -> Result<UserProfile, AuthError> {
        Ok(self.provider.update_display_name(name).await?)
    }
}
