//! Upload orchestration.
//!
//! One attempt runs the stages of [`UploadState`] in order:
//!
//! 1. validate the form locally (no network call on failure)
//! 2. request the video credential and transfer the video
//! 3. request the thumbnail credential bound to the issued video id and transfer the thumbnail
//! 4. persist the asset record with the thumbnail CDN URL and the probed duration
//!
//! The first failing stage aborts the attempt. Nothing already transferred is
//! rolled back; a video uploaded before the failure is reported as orphaned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use loomcast_core::models::{AssetRecord, FormFields, MediaKind, RawMedia};
use loomcast_core::validation::validate_form_fields;
use loomcast_core::{
    BrokerError, CredentialBroker, ErrorMetadata, LogLevel, MetadataFinalizer, SizePolicy,
    TransferExecutor, UploadConfig, UploadError, ValidationError,
};
use tokio::sync::{broadcast, oneshot};

use super::probe::DurationProbe;
use super::retry::RetryPolicy;
use super::selector::{MediaSelection, MediaSelector};
use super::state::UploadState;

/// Capacity of the state event channel. Slow subscribers miss older events.
const STATE_EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub broker_retry: RetryPolicy,
    /// How long finalization waits for a pending duration probe.
    pub duration_wait: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            broker_retry: RetryPolicy::default(),
            duration_wait: Duration::from_millis(5000),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            broker_retry: RetryPolicy::from_config(config),
            duration_wait: config.duration_wait(),
        }
    }
}

/// Everything the user filled in: two selection slots and the text fields.
pub struct UploadForm {
    pub video: MediaSelector,
    pub thumbnail: MediaSelector,
    pub fields: FormFields,
}

impl UploadForm {
    pub fn new(policy: SizePolicy) -> Self {
        Self {
            video: MediaSelector::new(policy),
            thumbnail: MediaSelector::new(policy),
            fields: FormFields::default(),
        }
    }

    /// Probe the duration of selected videos with `probe`.
    pub fn with_probe(self, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            video: self.video.with_probe(probe),
            ..self
        }
    }

    pub fn with_fields(mut self, fields: FormFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn select_video(&mut self, raw: RawMedia) -> Result<MediaSelection, ValidationError> {
        self.video.select(raw, MediaKind::Video)
    }

    pub fn select_thumbnail(&mut self, raw: RawMedia) -> Result<MediaSelection, ValidationError> {
        self.thumbnail.select(raw, MediaKind::Image)
    }

    /// Wait for a background recovery pass and install its result as the video.
    /// Returns whether a recording was adopted.
    pub async fn adopt_recovered(&mut self, recovered: oneshot::Receiver<MediaSelection>) -> bool {
        match recovered.await {
            Ok(selection) => {
                self.video.inject(selection);
                true
            }
            Err(_) => false,
        }
    }

    /// Clear both selections and all fields.
    pub fn reset(&mut self) {
        self.video.reset();
        self.thumbnail.reset();
        self.fields = FormFields::default();
    }

    fn validate(&self) -> Result<(MediaSelection, MediaSelection), ValidationError> {
        let video = self
            .video
            .current()
            .cloned()
            .ok_or_else(|| ValidationError::MissingField("video".to_string()))?;
        let thumbnail = self
            .thumbnail
            .current()
            .cloned()
            .ok_or_else(|| ValidationError::MissingField("thumbnail".to_string()))?;
        validate_form_fields(&self.fields)?;
        Ok((video, thumbnail))
    }
}

/// A failed attempt: the error, the stage it happened in, and the remote video
/// id if a video was uploaded but never catalogued.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Upload failed while {stage}: {error}")]
pub struct UploadFailure {
    #[source]
    pub error: UploadError,
    pub stage: UploadState,
    pub orphaned_video_id: Option<String>,
}

/// Drives one upload attempt at a time through the external ports.
pub struct UploadOrchestrator {
    broker: Arc<dyn CredentialBroker>,
    executor: Arc<dyn TransferExecutor>,
    finalizer: Arc<dyn MetadataFinalizer>,
    config: OrchestratorConfig,
    state: Mutex<UploadState>,
    events: broadcast::Sender<UploadState>,
}

impl UploadOrchestrator {
    pub fn new(
        broker: Arc<dyn CredentialBroker>,
        executor: Arc<dyn TransferExecutor>,
        finalizer: Arc<dyn MetadataFinalizer>,
        config: OrchestratorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(STATE_EVENT_CAPACITY);
        Self {
            broker,
            executor,
            finalizer,
            config,
            state: Mutex::new(UploadState::Idle),
            events,
        }
    }

    pub fn state(&self) -> UploadState {
        *self.lock_state()
    }

    /// Receive every state entered from now on, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadState> {
        self.events.subscribe()
    }

    /// Run one attempt for `form`. Refused with `AttemptInProgress` while
    /// another attempt is running. On success both selections and the fields
    /// are cleared.
    #[tracing::instrument(skip(self, form), fields(title = %form.fields.title))]
    pub async fn submit(&self, form: &mut UploadForm) -> Result<AssetRecord, UploadFailure> {
        let _attempt = match self.begin() {
            Ok(attempt) => attempt,
            Err(current) => {
                tracing::debug!(state = %current, "Submit refused, attempt already in progress");
                return Err(UploadFailure {
                    error: UploadError::AttemptInProgress,
                    stage: current,
                    orphaned_video_id: None,
                });
            }
        };

        let (video, thumbnail) = match form.validate() {
            Ok(selections) => selections,
            Err(e) => {
                self.transition(UploadState::Idle);
                let failure = UploadFailure {
                    error: e.into(),
                    stage: UploadState::Validating,
                    orphaned_video_id: None,
                };
                log_failure(&failure);
                return Err(failure);
            }
        };

        let mut uploaded_video_id = None;
        let outcome = self
            .run(&video, &thumbnail, &form.fields, &mut uploaded_video_id)
            .await;

        match outcome {
            Ok(record) => {
                self.transition(UploadState::Done);
                form.reset();
                tracing::info!(
                    video_id = %record.video_id,
                    thumbnail_url = %record.thumbnail_url,
                    duration = ?record.duration,
                    "Upload completed"
                );
                Ok(record)
            }
            Err(error) => {
                let stage = self.state();
                self.transition(UploadState::Failed);
                let failure = UploadFailure {
                    error,
                    stage,
                    orphaned_video_id: uploaded_video_id,
                };
                log_failure(&failure);
                Err(failure)
            }
        }
    }

    async fn run(
        &self,
        video: &MediaSelection,
        thumbnail: &MediaSelection,
        fields: &FormFields,
        uploaded_video_id: &mut Option<String>,
    ) -> Result<AssetRecord, UploadError> {
        self.transition(UploadState::RequestingVideoCredential);
        let video_credential = self
            .config
            .broker_retry
            .run("video credential", || self.broker.request_video_credential())
            .await?;
        let video_id = video_credential.video_id().to_string();

        self.transition(UploadState::UploadingVideo);
        let ack = self
            .executor
            .transfer(video_credential, video.payload())
            .await?;
        tracing::debug!(video_id = %video_id, status = ack.status, "Video transfer acknowledged");
        *uploaded_video_id = Some(video_id.clone());

        self.transition(UploadState::RequestingThumbnailCredential);
        let thumbnail_credential = self
            .config
            .broker_retry
            .run("thumbnail credential", || {
                self.broker.request_thumbnail_credential(&video_id)
            })
            .await?;
        if thumbnail_credential.video_id() != video_id {
            return Err(BrokerError::MissingCredential(format!(
                "thumbnail credential issued for video {} instead of {}",
                thumbnail_credential.video_id(),
                video_id
            ))
            .into());
        }
        let cdn_url = thumbnail_credential
            .cdn_url()
            .map(str::to_string)
            .ok_or_else(|| BrokerError::MissingCredential("cdnUrl".to_string()))?;

        self.transition(UploadState::UploadingThumbnail);
        let ack = self
            .executor
            .transfer(thumbnail_credential, thumbnail.payload())
            .await?;
        tracing::debug!(video_id = %video_id, status = ack.status, "Thumbnail transfer acknowledged");

        self.transition(UploadState::Finalizing);
        let duration = video.duration().resolve(self.config.duration_wait).await;
        let record = self
            .finalizer
            .finalize(&video_id, &cdn_url, duration, fields)
            .await?;

        Ok(record)
    }

    /// Atomically claim the orchestrator for a new attempt. Returns the current
    /// state if an attempt is already running.
    fn begin(&self) -> Result<Attempt<'_>, UploadState> {
        let mut state = self.lock_state();
        if state.is_busy() {
            return Err(*state);
        }
        if *state != UploadState::Idle {
            self.enter(&mut state, UploadState::Idle);
        }
        self.enter(&mut state, UploadState::Validating);
        Ok(Attempt { orchestrator: self })
    }

    fn transition(&self, next: UploadState) {
        let mut state = self.lock_state();
        self.enter(&mut state, next);
    }

    fn enter(&self, state: &mut MutexGuard<'_, UploadState>, next: UploadState) {
        if !state.can_transition_to(next) {
            tracing::error!(from = %**state, to = %next, "Illegal upload state transition");
        }
        **state = next;
        tracing::info!(state = %next, "Upload state changed");
        // No subscribers is fine.
        let _ = self.events.send(next);
    }

    fn lock_state(&self) -> MutexGuard<'_, UploadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Claim on the orchestrator for one attempt. Dropped while a stage is still
/// running (the `submit` future was cancelled), it ends the attempt so the
/// next submit is not refused.
struct Attempt<'a> {
    orchestrator: &'a UploadOrchestrator,
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        let mut state = self.orchestrator.lock_state();
        match *state {
            UploadState::Validating => self.orchestrator.enter(&mut state, UploadState::Idle),
            current if current.is_busy() => {
                tracing::warn!(stage = %current, "Upload attempt abandoned");
                self.orchestrator.enter(&mut state, UploadState::Failed);
            }
            _ => {}
        }
    }
}

fn log_failure(failure: &UploadFailure) {
    let error = &failure.error;
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %error,
            error_code = error.error_code(),
            stage = %failure.stage,
            "Upload attempt rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %error,
            error_code = error.error_code(),
            stage = %failure.stage,
            recoverable = error.is_recoverable(),
            "Upload attempt failed"
        ),
        LogLevel::Error => tracing::error!(
            error = %error,
            error_code = error.error_code(),
            stage = %failure.stage,
            recoverable = error.is_recoverable(),
            "Upload attempt failed"
        ),
    }

    if let Some(video_id) = &failure.orphaned_video_id {
        tracing::warn!(
            video_id = %video_id,
            stage = %failure.stage,
            "Video was uploaded but never catalogued"
        );
    }
}
