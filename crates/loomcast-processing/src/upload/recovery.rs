//! Rehydrates a recorded-but-not-uploaded video left behind by the recorder.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::oneshot;

use loomcast_core::models::{MediaKind, RawMedia, RecordingCheckpoint, RECORDED_VIDEO_KEY};
use loomcast_storage::{BlobSource, CheckpointStore, SessionStorage};

use super::selector::{MediaSelection, MediaSelector};

/// Consumes the session checkpoint at most once per session entry.
///
/// Whatever the outcome, the checkpoint entry is removed and the blob it points
/// to is released, so a second pass without a new checkpoint is a no-op.
#[derive(Clone)]
pub struct SessionRecoveryAgent {
    checkpoints: Arc<dyn CheckpointStore>,
    blobs: Arc<dyn BlobSource>,
}

impl SessionRecoveryAgent {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>, blobs: Arc<dyn BlobSource>) -> Self {
        Self { checkpoints, blobs }
    }

    pub fn from_storage(storage: &SessionStorage) -> Self {
        Self::new(storage.checkpoints.clone(), storage.blobs.clone())
    }

    /// Look for a checkpoint and, if one is usable, run it through `selector`
    /// as a video selection. Failures are logged and yield `None`.
    #[tracing::instrument(skip(self, selector))]
    pub async fn recover(&self, selector: &mut MediaSelector) -> Option<MediaSelection> {
        let raw = match self.checkpoints.get(RECORDED_VIDEO_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read recording checkpoint");
                return None;
            }
        };

        let checkpoint = RecordingCheckpoint::parse(&raw);
        let outcome = match &checkpoint {
            Ok(checkpoint) => self.rehydrate(checkpoint, selector).await,
            Err(e) => Err(anyhow::anyhow!("Malformed recording checkpoint: {}", e)),
        };

        if let Err(e) = self.checkpoints.remove(RECORDED_VIDEO_KEY).await {
            tracing::warn!(error = %e, "Failed to remove recording checkpoint");
        }
        if let Ok(checkpoint) = &checkpoint {
            if let Err(e) = self.blobs.release(&checkpoint.url).await {
                tracing::warn!(error = %e, url = %checkpoint.url, "Failed to release recorded blob");
            }
        }

        match outcome {
            Ok(selection) => {
                tracing::info!(
                    file_name = %selection.name(),
                    size = selection.size(),
                    duration = ?selection.duration().current(),
                    "Recovered recorded video"
                );
                Some(selection)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to recover recorded video");
                None
            }
        }
    }

    async fn rehydrate(
        &self,
        checkpoint: &RecordingCheckpoint,
        selector: &mut MediaSelector,
    ) -> Result<MediaSelection> {
        let data = self
            .blobs
            .fetch(&checkpoint.url)
            .await
            .with_context(|| format!("Failed to fetch recorded blob {}", checkpoint.url))?;

        let raw = RawMedia::new(checkpoint.name.clone(), data)
            .with_content_type(checkpoint.content_type.clone());

        let selection = selector
            .select_with_duration(raw, MediaKind::Video, checkpoint.duration)
            .context("Recorded video rejected")?;

        Ok(selection)
    }

    /// Run one recovery pass in the background. The receiver yields the
    /// recovered selection, or an error if there was nothing to recover.
    pub fn spawn(self, mut selector: MediaSelector) -> oneshot::Receiver<MediaSelection> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Some(selection) = self.recover(&mut selector).await {
                // The form may have been dropped before recovery finished.
                let _ = tx.send(selection);
            }
        });
        rx
    }
}
