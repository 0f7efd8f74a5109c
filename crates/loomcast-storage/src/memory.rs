//! Process-local backends. Entries live only as long as the process.

use crate::keys::validate_key;
use crate::traits::{BlobSource, CheckpointStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn poisoned() -> StorageError {
    StorageError::ConfigError("Storage lock poisoned".to_string())
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCheckpointStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryBlobSource {
    blobs: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl MemoryBlobSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blob under `url`, as a recorder would.
    pub fn insert(&self, url: impl Into<String>, data: impl Into<Bytes>) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(url.into(), data.into());
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(url))
            .unwrap_or(false)
    }
}

#[async_trait]
impl BlobSource for MemoryBlobSource {
    async fn fetch(&self, url: &str) -> StorageResult<Bytes> {
        let blobs = self.blobs.lock().map_err(|_| poisoned())?;
        blobs
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }

    async fn release(&self, url: &str) -> StorageResult<()> {
        let mut blobs = self.blobs.lock().map_err(|_| poisoned())?;
        blobs.remove(url);
        Ok(())
    }
}
