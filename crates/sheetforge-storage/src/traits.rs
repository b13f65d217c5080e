//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use sheetforge_core::StorageBackend;
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

    #[error("Blob not found: {0}")]
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
/// All storage backends (S3, local filesystem, in-memory) must implement this
/// trait. The gangsheet engine works against it so job orchestration never
/// couples to a specific backend.
///
/// **Key format:** Keys are produced by the `keys` module and live under
/// `gangsheets/{tenant_id}/{gangsheet_id}/`. See the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a storage key and return the publicly accessible URL.
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str)
        -> StorageResult<String>;

    /// Download a blob by its storage key.
    async fn get(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Delete a blob by its storage key. Deleting a missing blob is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Delete every blob under a key prefix. Returns the number of blobs removed.
    ///
    /// Used for whole-job cleanup when a gangsheet is cancelled or its upload
    /// is rolled back.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<usize>;

    /// Check if a blob exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// The publicly accessible URL for a storage key, without touching the backend.
    fn url_for(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
