//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use std::time::Duration;
use streamvault_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait so
/// the ingestion pipeline can work against any backend without coupling to
/// implementation details.
///
/// **Key format:** `videos/{owner_id}/{asset_id}/{role}/{filename}` — see
/// [`crate::keys`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data under the given key and return the public URL.
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Download an object by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by its storage key. Deleting a missing object is not
    /// an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Delete every object under a key prefix (folder-style purge).
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()>;

    /// Generate a time-limited URL granting read access without separate
    /// authentication. Backends without signing support return the plain
    /// public URL.
    async fn signed_url(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Check if an object exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
