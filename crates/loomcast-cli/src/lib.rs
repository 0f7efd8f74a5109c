use anyhow::{Context, Result};
use loomcast_core::models::{
    content_type_for_filename, MediaKind, RawMedia, RecordingCheckpoint, RECORDED_VIDEO_KEY,
};
use loomcast_storage::CheckpointStore;
use serde::Serialize;
use std::path::Path;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Invalid file name: {}", path.display()))
}

/// Read a local file as a selectable media payload.
pub async fn read_media(path: &Path) -> Result<RawMedia> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(RawMedia::new(file_name(path)?, data))
}

/// Copy `file` into `blob_dir` and leave a checkpoint pointing at it, the way
/// the recorder does after a recording stops.
pub async fn write_recording_checkpoint(
    checkpoints: &dyn CheckpointStore,
    blob_dir: &Path,
    file: &Path,
    duration: Option<f64>,
) -> Result<RecordingCheckpoint> {
    let name = file_name(file)?;
    let content_type = content_type_for_filename(&name)
        .filter(|ct| MediaKind::Video.accepts(ct))
        .with_context(|| format!("Unknown video type for {}", name))?;

    tokio::fs::copy(file, blob_dir.join(&name))
        .await
        .with_context(|| format!("Failed to copy {} into session storage", file.display()))?;

    let checkpoint = RecordingCheckpoint {
        url: name.clone(),
        name,
        content_type: content_type.to_string(),
        duration,
    };
    let raw = serde_json::to_string(&checkpoint).context("Serialize checkpoint")?;
    checkpoints
        .put(RECORDED_VIDEO_KEY, &raw)
        .await
        .context("Failed to write recording checkpoint")?;

    Ok(checkpoint)
}
