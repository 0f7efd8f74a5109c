//! Storage abstraction traits
//!
//! Every checkpoint backend implements [`CheckpointStore`]; every blob backend
//! implements [`BlobSource`].

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Session-scoped key/value slot written by an out-of-band recorder.
///
/// Values are stored raw so a malformed entry can still be read and removed.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the entry under `key`, if any.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write (or replace) the entry under `key`.
    async fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the entry under `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Source of ephemeral blobs referenced by a checkpoint.
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Fetch the full contents behind `url`.
    async fn fetch(&self, url: &str) -> StorageResult<Bytes>;

    /// Release the blob so it cannot be rehydrated again. Releasing a missing blob is not an error.
    async fn release(&self, url: &str) -> StorageResult<()>;
}
