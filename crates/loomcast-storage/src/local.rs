use crate::keys::{key_to_filename, validate_key};
use crate::traits::{BlobSource, CheckpointStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

async fn ensure_dir(path: &Path) -> StorageResult<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        StorageError::ConfigError(format!(
            "Failed to create storage directory {}: {}",
            path.display(),
            e
        ))
    })
}

/// Filesystem checkpoint store shared with a recorder running in another process.
#[derive(Clone, Debug)]
pub struct LocalCheckpointStore {
    base_path: PathBuf,
}

impl LocalCheckpointStore {
    /// Create a store rooted at `base_path` (e.g. "{session_dir}/checkpoints").
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        ensure_dir(&base_path).await?;
        Ok(Self { base_path })
    }

    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key_to_filename(key)))
    }
}

#[async_trait]
impl CheckpointStore for LocalCheckpointStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_to_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        // Write beside the target and rename so readers never see a partial entry.
        let tmp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", tmp_path.display(), e)))?;
        file.write_all(value.as_bytes())
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", tmp_path.display(), e)))?;
        file.flush().await?;
        drop(file);

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(key = %key, path = %path.display(), "Checkpoint written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Blobs written by the recorder under a base directory.
///
/// References may be `file://` URLs, absolute paths, or paths relative to the
/// base directory. Anything resolving outside the base directory is rejected.
#[derive(Clone, Debug)]
pub struct LocalBlobSource {
    base_path: PathBuf,
}

impl LocalBlobSource {
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        ensure_dir(&base_path).await?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a blob reference to a filesystem path with security validation.
    fn url_to_path(&self, url: &str) -> StorageResult<PathBuf> {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        if raw.is_empty() || raw.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "Invalid blob reference: {}",
                url
            )));
        }
        let decoded = urlencoding::decode(raw)
            .map_err(|e| StorageError::InvalidKey(format!("Invalid blob reference {}: {}", url, e)))?;

        let candidate = Path::new(decoded.as_ref());
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_path.join(candidate)
        };

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        match path.canonicalize() {
            Ok(canonical) => {
                if canonical.strip_prefix(&base_canonical).is_err() {
                    return Err(StorageError::InvalidKey(
                        "Blob reference resolves outside storage directory".to_string(),
                    ));
                }
                Ok(canonical)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(url.to_string()))
            }
            Err(e) => Err(StorageError::ReadFailed(format!("{}: {}", url, e))),
        }
    }
}

#[async_trait]
impl BlobSource for LocalBlobSource {
    async fn fetch(&self, url: &str) -> StorageResult<Bytes> {
        let path = self.url_to_path(url)?;
        let data = fs::read(&path)
            .await
            .map_err(|e| StorageError::ReadFailed(format!("{}: {}", path.display(), e)))?;
        Ok(Bytes::from(data))
    }

    async fn release(&self, url: &str) -> StorageResult<()> {
        let path = match self.url_to_path(url) {
            Ok(path) => path,
            Err(StorageError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }
}
