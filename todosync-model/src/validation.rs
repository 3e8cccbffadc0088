//! Local input validation, applied before any backend call.
//!
//! A [`ValidationError`] never reaches the backend: it is surfaced
//! immediately to the caller that issued the intent. Lengths are counted
//! in characters, not bytes.

use thiserror::Error;

use crate::task::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, TaskDraft, TaskPatch};

/// Errors raised by local validation of user-supplied input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {MAX_TITLE_LENGTH} characters)")]
    TitleTooLong,
    /// Task description exceeds the maximum length.
    #[error("task description too long (max {MAX_DESCRIPTION_LENGTH} characters)")]
    DescriptionTooLong,
    /// A patch must change at least one field.
    #[error("update contains no fields")]
    EmptyPatch,
    /// Priority must be one of the three valid ordinals.
    #[error("invalid priority ordinal {0} (expected 1, 2, or 3)")]
    InvalidPriority(u8),
    /// Email address is not plausibly formed.
    #[error("email address is not valid")]
    EmailInvalid,
    /// Password is shorter than the required minimum.
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),
    /// Password and confirmation do not match.
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// Validates a creation payload.
///
/// # Errors
///
/// Returns [`ValidationError::TitleEmpty`], [`ValidationError::TitleTooLong`],
/// or [`ValidationError::DescriptionTooLong`].
pub fn validate_draft(draft: &TaskDraft) -> Result<(), ValidationError> {
    validate_title(&draft.title)?;
    if let Some(description) = &draft.description {
        validate_description(description)?;
    }
    Ok(())
}

/// Validates a sparse update payload.
///
/// An entirely empty patch is rejected; present fields are checked with the
/// same rules as creation.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPatch`] or the per-field errors of
/// [`validate_draft`].
pub fn validate_patch(patch: &TaskPatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    Ok(())
}

/// Validates a task title against the emptiness and length rules.
///
/// # Errors
///
/// Returns [`ValidationError::TitleEmpty`] or [`ValidationError::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validates a task description against the length rule.
///
/// # Errors
///
/// Returns [`ValidationError::DescriptionTooLong`].
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

/// Validates the shape of an email address.
///
/// Deliberately shallow: a non-empty local part and domain around a single
/// `@`, no whitespace. Real verification belongs to the identity provider.
///
/// # Errors
///
/// Returns [`ValidationError::EmailInvalid`].
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalid);
    };
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

/// Validates a password against the configured minimum length.
///
/// # Errors
///
/// Returns [`ValidationError::PasswordTooShort`].
pub fn validate_password(password: &str, min_length: usize) -> Result<(), ValidationError> {
    if password.chars().count() < min_length {
        return Err(ValidationError::PasswordTooShort(min_length));
    }
    Ok(())
}
