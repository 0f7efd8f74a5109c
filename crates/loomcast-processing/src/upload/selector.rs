//! Media selection: size/type policy, preview materialization and duration probing.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use loomcast_core::models::{content_type_for_filename, MediaKind, MediaPayload, RawMedia};
use loomcast_core::{SizePolicy, ValidationError};
use tokio::sync::watch;
use uuid::Uuid;

use super::probe::DurationProbe;

/// Locally viewable copy of a selected file. The backing file is removed once
/// the last clone of the selection holding it is dropped.
#[derive(Clone, Debug)]
pub struct PreviewRef {
    id: Uuid,
    file: Arc<tempfile::TempPath>,
}

impl PreviewRef {
    fn materialize(payload: &MediaPayload) -> std::io::Result<Self> {
        let suffix = Path::new(&payload.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("loomcast-preview-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&payload.data)?;
        file.flush()?;

        Ok(Self {
            id: Uuid::new_v4(),
            file: Arc::new(file.into_temp_path()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.file
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DurationState {
    Pending,
    Known(f64),
    Unavailable,
}

impl DurationState {
    fn seconds(&self) -> Option<f64> {
        match self {
            DurationState::Known(seconds) => Some(*seconds),
            DurationState::Pending | DurationState::Unavailable => None,
        }
    }
}

/// Duration of a selected video, possibly still being probed.
#[derive(Clone, Debug)]
pub struct DurationHandle {
    rx: watch::Receiver<DurationState>,
}

impl DurationHandle {
    pub fn known(seconds: f64) -> Self {
        let (_tx, rx) = watch::channel(DurationState::Known(seconds));
        Self { rx }
    }

    pub fn unavailable() -> Self {
        let (_tx, rx) = watch::channel(DurationState::Unavailable);
        Self { rx }
    }

    fn pending() -> (watch::Sender<DurationState>, Self) {
        let (tx, rx) = watch::channel(DurationState::Pending);
        (tx, Self { rx })
    }

    /// Duration if already known, without waiting.
    pub fn current(&self) -> Option<f64> {
        self.rx.borrow().seconds()
    }

    pub fn is_pending(&self) -> bool {
        *self.rx.borrow() == DurationState::Pending
    }

    /// Wait up to `wait` for a pending probe. Returns `None` if the probe
    /// failed, was abandoned or did not finish in time.
    pub async fn resolve(&self, wait: Duration) -> Option<f64> {
        let mut rx = self.rx.clone();
        let settled = tokio::time::timeout(
            wait,
            rx.wait_for(|state| *state != DurationState::Pending),
        )
        .await;

        match settled {
            Ok(Ok(state)) => state.seconds(),
            Ok(Err(_)) => None,
            Err(_) => {
                tracing::warn!(
                    wait_ms = wait.as_millis() as u64,
                    "Duration probe did not finish in time, continuing without duration"
                );
                None
            }
        }
    }
}

/// An accepted file: payload, preview and (for video) duration.
#[derive(Clone, Debug)]
pub struct MediaSelection {
    kind: MediaKind,
    payload: MediaPayload,
    preview: Option<PreviewRef>,
    duration: DurationHandle,
}

impl MediaSelection {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn payload(&self) -> &MediaPayload {
        &self.payload
    }

    pub fn name(&self) -> &str {
        &self.payload.name
    }

    pub fn content_type(&self) -> &str {
        &self.payload.content_type
    }

    pub fn size(&self) -> u64 {
        self.payload.size()
    }

    /// `None` when the preview could not be written to disk.
    pub fn preview(&self) -> Option<&PreviewRef> {
        self.preview.as_ref()
    }

    pub fn duration(&self) -> &DurationHandle {
        &self.duration
    }

    /// Same media selected twice: equal payloads, ignoring preview identity.
    pub fn same_media(&self, other: &MediaSelection) -> bool {
        self.kind == other.kind && self.payload == other.payload
    }
}

/// Holds at most one selection for a form slot and applies the size policy.
pub struct MediaSelector {
    policy: SizePolicy,
    probe: Option<Arc<dyn DurationProbe>>,
    current: Option<MediaSelection>,
}

impl MediaSelector {
    pub fn new(policy: SizePolicy) -> Self {
        Self {
            policy,
            probe: None,
            current: None,
        }
    }

    /// Probe video durations in the background after selection.
    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn policy(&self) -> &SizePolicy {
        &self.policy
    }

    /// Accept `raw` as `kind`, replacing any current selection. On rejection the
    /// current selection is left untouched.
    pub fn select(
        &mut self,
        raw: RawMedia,
        kind: MediaKind,
    ) -> Result<MediaSelection, ValidationError> {
        self.select_with_duration(raw, kind, None)
    }

    /// Like [`select`](Self::select), but with a duration already known to the
    /// caller. A known duration skips probing.
    pub fn select_with_duration(
        &mut self,
        raw: RawMedia,
        kind: MediaKind,
        known_duration: Option<f64>,
    ) -> Result<MediaSelection, ValidationError> {
        let payload = self.check(raw, kind)?;

        let preview = match PreviewRef::materialize(&payload) {
            Ok(preview) => Some(preview),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file_name = %payload.name,
                    "Failed to write preview file"
                );
                None
            }
        };

        let duration = self.duration_for(kind, known_duration, preview.as_ref());

        tracing::debug!(
            kind = %kind,
            file_name = %payload.name,
            content_type = %payload.content_type,
            size = payload.size(),
            "Media selected"
        );

        let selection = MediaSelection {
            kind,
            payload,
            preview,
            duration,
        };
        self.current = Some(selection.clone());
        Ok(selection)
    }

    /// Install a selection produced elsewhere (recovery), replacing the current one.
    pub fn inject(&mut self, selection: MediaSelection) {
        self.current = Some(selection);
    }

    pub fn current(&self) -> Option<&MediaSelection> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<MediaSelection> {
        self.current.take()
    }

    /// Discard the current selection and release its preview.
    pub fn reset(&mut self) {
        if let Some(selection) = self.current.take() {
            tracing::debug!(file_name = %selection.name(), "Selection reset");
        }
    }

    fn check(&self, raw: RawMedia, kind: MediaKind) -> Result<MediaPayload, ValidationError> {
        let size = raw.size();
        if size == 0 {
            return Err(ValidationError::EmptyFile(raw.name));
        }

        let max = self.policy.max_for(kind);
        if size > max {
            return Err(ValidationError::SizeExceeded { kind, size, max });
        }

        let content_type = raw
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .or_else(|| content_type_for_filename(&raw.name).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !kind.accepts(&content_type) {
            return Err(ValidationError::UnsupportedType { kind, content_type });
        }

        Ok(MediaPayload {
            name: raw.name,
            content_type,
            data: raw.data,
        })
    }

    fn duration_for(
        &self,
        kind: MediaKind,
        known_duration: Option<f64>,
        preview: Option<&PreviewRef>,
    ) -> DurationHandle {
        if let Some(seconds) = known_duration {
            return DurationHandle::known(seconds);
        }
        if kind != MediaKind::Video {
            return DurationHandle::unavailable();
        }

        let (Some(probe), Some(preview)) = (self.probe.clone(), preview.cloned()) else {
            return DurationHandle::unavailable();
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime available, skipping duration probe");
            return DurationHandle::unavailable();
        };

        let (tx, handle) = DurationHandle::pending();
        runtime.spawn(async move {
            let state = match probe.probe(preview.path()).await {
                Ok(seconds) => DurationState::Known(seconds),
                Err(e) => {
                    tracing::warn!(error = %e, "Duration probe failed");
                    DurationState::Unavailable
                }
            };
            // Receivers may all be gone if the selection was reset meanwhile.
            let _ = tx.send(state);
            drop(preview);
        });
        handle
    }
}
