use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fixed key under which the recorder leaves its checkpoint.
pub const RECORDED_VIDEO_KEY: &str = "recordedVideo";

/// Transient record written by an out-of-band recording flow describing a
/// not-yet-uploaded video blob.
///
/// Wire shape: `{url, name, type, duration}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordingCheckpoint {
    /// Ephemeral blob reference: a `file://` URL or a path inside the
    /// session blob directory.
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub url: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub content_type: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl RecordingCheckpoint {
    /// Parse and validate a stored checkpoint entry.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let checkpoint: RecordingCheckpoint = serde_json::from_str(raw)?;
        checkpoint.validate()?;
        if let Some(duration) = checkpoint.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(anyhow::anyhow!("Invalid checkpoint duration: {}", duration));
            }
        }
        Ok(checkpoint)
    }
}
