use crate::{
    BlobSource, CheckpointBackend, CheckpointStore, LocalBlobSource, LocalCheckpointStore,
    MemoryBlobSource, MemoryCheckpointStore, StorageResult,
};
use loomcast_core::UploadConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Checkpoint store plus the blob source its references point into.
#[derive(Clone)]
pub struct SessionStorage {
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub blobs: Arc<dyn BlobSource>,
}

/// Directory holding checkpoint entries for the local backend.
pub fn checkpoint_dir(session_dir: &Path) -> PathBuf {
    session_dir.join("checkpoints")
}

/// Directory recorded blobs are written to and resolved against for the local backend.
pub fn blob_dir(session_dir: &Path) -> PathBuf {
    session_dir.join("blobs")
}

/// Create the session storage backends based on configuration
pub async fn create_session_storage(config: &UploadConfig) -> StorageResult<SessionStorage> {
    match config.checkpoint_backend {
        CheckpointBackend::Local => {
            let checkpoints =
                LocalCheckpointStore::new(checkpoint_dir(&config.session_dir)).await?;
            let blobs = LocalBlobSource::new(blob_dir(&config.session_dir)).await?;
            tracing::debug!(
                session_dir = %config.session_dir.display(),
                "Using local session storage"
            );
            Ok(SessionStorage {
                checkpoints: Arc::new(checkpoints),
                blobs: Arc::new(blobs),
            })
        }
        CheckpointBackend::Memory => Ok(SessionStorage {
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
            blobs: Arc::new(MemoryBlobSource::new()),
        }),
    }
}
