//! Mock port implementations for testing
//!
//! Every mock appends to a shared [`CallLog`] so tests can assert on the exact
//! order in which the orchestrator touched the outside world.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use loomcast_core::models::{AssetRecord, FormFields, MediaKind, MediaPayload, UploadCredential};
use loomcast_core::{
    BrokerError, CredentialBroker, FinalizeError, MetadataFinalizer, TransferAck, TransferError,
    TransferExecutor,
};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::upload::DurationProbe;

pub const VIDEO_ID: &str = "vid-123";

/// Ordered record of port calls shared by the mocks.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == entry)
            .count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|e| e == entry)
    }
}

/// Broker issuing credentials for [`VIDEO_ID`], with scripted failures.
pub struct MockBroker {
    log: CallLog,
    video_failures: Mutex<VecDeque<BrokerError>>,
    thumbnail_failures: Mutex<VecDeque<BrokerError>>,
    gate: Option<Arc<Notify>>,
    thumbnail_video_id: Option<String>,
}

impl MockBroker {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            video_failures: Mutex::new(VecDeque::new()),
            thumbnail_failures: Mutex::new(VecDeque::new()),
            gate: None,
            thumbnail_video_id: None,
        }
    }

    /// Fail the next video credential requests with these errors, in order.
    pub fn fail_video_with(self, errors: Vec<BrokerError>) -> Self {
        *self.video_failures.lock().unwrap() = errors.into();
        self
    }

    pub fn fail_thumbnail_with(self, errors: Vec<BrokerError>) -> Self {
        *self.thumbnail_failures.lock().unwrap() = errors.into();
        self
    }

    /// Bind thumbnail credentials to `video_id` whatever video was asked for.
    pub fn thumbnail_bound_to(mut self, video_id: &str) -> Self {
        self.thumbnail_video_id = Some(video_id.to_string());
        self
    }

    /// Block video credential requests until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl CredentialBroker for MockBroker {
    async fn request_video_credential(&self) -> Result<UploadCredential, BrokerError> {
        self.log.push("video_credential");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.video_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(UploadCredential::video(
            VIDEO_ID.to_string(),
            format!("https://storage.test/videos/{}", VIDEO_ID),
            "video-access-key".to_string(),
        ))
    }

    async fn request_thumbnail_credential(
        &self,
        video_id: &str,
    ) -> Result<UploadCredential, BrokerError> {
        self.log.push(format!("thumbnail_credential:{}", video_id));
        if let Some(err) = self.thumbnail_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(UploadCredential::thumbnail(
            self.thumbnail_video_id
                .clone()
                .unwrap_or_else(|| video_id.to_string()),
            format!("https://storage.test/thumbnails/{}", video_id),
            "thumbnail-access-key".to_string(),
            format!("https://cdn.test/thumbnails/{}.png", video_id),
        ))
    }
}

/// What a [`MockExecutor`] saw for one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTransfer {
    pub kind: MediaKind,
    pub upload_url: String,
    pub access_key: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Default)]
pub struct MockExecutor {
    log: CallLog,
    transfers: Mutex<Vec<RecordedTransfer>>,
    failures: Mutex<HashMap<MediaKind, TransferError>>,
}

impl MockExecutor {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn fail_kind(self, kind: MediaKind, error: TransferError) -> Self {
        self.failures.lock().unwrap().insert(kind, error);
        self
    }

    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.transfers.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferExecutor for MockExecutor {
    async fn transfer(
        &self,
        credential: UploadCredential,
        payload: &MediaPayload,
    ) -> Result<TransferAck, TransferError> {
        let kind = credential.kind();
        self.log.push(format!("transfer:{}", kind));
        if let Some(err) = self.failures.lock().unwrap().get(&kind) {
            return Err(err.clone());
        }
        self.transfers.lock().unwrap().push(RecordedTransfer {
            kind,
            upload_url: credential.upload_url().to_string(),
            access_key: credential.access_key().to_string(),
            content_type: payload.content_type.clone(),
            size: payload.size(),
        });
        Ok(TransferAck { status: 201 })
    }
}

#[derive(Default)]
pub struct MockFinalizer {
    log: CallLog,
    records: Mutex<Vec<AssetRecord>>,
    failure: Option<FinalizeError>,
}

impl MockFinalizer {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn failing(mut self, error: FinalizeError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn records(&self) -> Vec<AssetRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataFinalizer for MockFinalizer {
    async fn finalize(
        &self,
        video_id: &str,
        thumbnail_cdn_url: &str,
        duration: Option<f64>,
        fields: &FormFields,
    ) -> Result<AssetRecord, FinalizeError> {
        self.log.push("finalize");
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let record = AssetRecord::new(
            video_id.to_string(),
            thumbnail_cdn_url.to_string(),
            duration,
            fields,
        );
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }
}

/// Probe returning a fixed duration, optionally after a delay.
pub struct StaticProbe {
    duration: Option<f64>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticProbe {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            duration: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurationProbe for StaticProbe {
    async fn probe(&self, _path: &Path) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.duration.ok_or_else(|| anyhow!("no duration"))
    }
}
