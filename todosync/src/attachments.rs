//! Task image attachments.
//!
//! Images live in the object store, never inline in task documents; a
//! task references its image by URL only. Objects are stored under
//! `images/{owner}/{file_name}` with names of the form
//! `todo_image_{timestamp}_{token}.{extension}`, so uploads never collide.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

use todosync_backend::objects::{ObjectStore, UploadError};
use todosync_model::user::UserId;

/// Extension used when the caller does not know the image format.
const DEFAULT_EXTENSION: &str = "jpg";

/// Length of the random token embedded in generated file names.
const TOKEN_LENGTH: usize = 8;

/// Client for uploading task images to the object store.
#[derive(Clone)]
pub struct Attachments {
    objects: Arc<ObjectStore>,
}

impl Attachments {
    /// Creates an attachment client over the given object store.
    #[must_use]
    pub fn new(objects: Arc<ObjectStore>) -> Self {
        Self { objects }
    }

    /// Uploads an image for `owner` and returns its URL.
    ///
    /// The object is stored at `images/{owner}/{file_name}` with a
    /// generated file name; `extension` defaults to `jpg` when unknown.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] when the store rejects the upload; nothing
    /// is partially stored in that case.
    pub async fn upload(
        &self,
        owner: &UserId,
        bytes: &[u8],
        extension: Option<&str>,
    ) -> Result<String, UploadError> {
        let path = format!("images/{owner}/{}", generate_file_name(extension));
        self.objects.upload(&path, bytes.to_vec()).await
    }
}

/// Generates `todo_image_{timestamp}_{token}.{extension}`.
fn generate_file_name(extension: Option<&str>) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let token: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let extension = extension.unwrap_or(DEFAULT_EXTENSION);
    format!("todo_image_{timestamp}_{token}.{extension}")
}
