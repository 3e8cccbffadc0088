//! Object storage with upload and URL resolution.
//!
//! Stand-in for a managed blob store: bytes go in under a caller-chosen
//! path, a stable URL comes back. Uploads are all-or-nothing; a failed
//! upload leaves no partial object behind.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Default per-object size limit, matching typical mobile photo uploads.
const DEFAULT_MAX_OBJECT_BYTES: usize = 8 * 1024 * 1024;

/// Errors raised by object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The object path must not be empty.
    #[error("object path cannot be empty")]
    EmptyPath,
    /// The object exceeds the store's per-object size limit.
    #[error("object of {size} bytes exceeds limit of {limit} bytes")]
    QuotaExceeded {
        /// Size of the rejected object.
        size: usize,
        /// Configured per-object limit.
        limit: usize,
    },
    /// No object exists at the requested path.
    #[error("no object at path: {0}")]
    NotFound(String),
}

/// In-memory object store keyed by path.
pub struct ObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    max_object_bytes: usize,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    /// Creates an empty store with the default per-object size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_object_bytes(DEFAULT_MAX_OBJECT_BYTES)
    }

    /// Creates an empty store that rejects objects above `max_object_bytes`.
    #[must_use]
    pub fn with_max_object_bytes(max_object_bytes: usize) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            max_object_bytes,
        }
    }

    /// Stores `bytes` at `path`, replacing any existing object, and
    /// returns the object's URL.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::EmptyPath`] for an empty path and
    /// [`UploadError::QuotaExceeded`] when the object is over the limit.
    pub async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        if path.is_empty() {
            return Err(UploadError::EmptyPath);
        }
        if bytes.len() > self.max_object_bytes {
            return Err(UploadError::QuotaExceeded {
                size: bytes.len(),
                limit: self.max_object_bytes,
            });
        }
        self.objects.write().await.insert(path.to_string(), bytes);
        Ok(Self::url_for(path))
    }

    /// Returns the URL of an existing object.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::NotFound`] when nothing is stored at `path`.
    pub async fn get_url(&self, path: &str) -> Result<String, UploadError> {
        if self.objects.read().await.contains_key(path) {
            Ok(Self::url_for(path))
        } else {
            Err(UploadError::NotFound(path.to_string()))
        }
    }

    /// Returns the stored bytes at `path`, if any.
    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(path).cloned()
    }

    fn url_for(path: &str) -> String {
        format!("mem://{path}")
    }
}
