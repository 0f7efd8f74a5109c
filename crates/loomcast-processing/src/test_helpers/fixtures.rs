//! Test fixtures: sample files, form fields and a wired-up orchestrator.

use loomcast_core::models::{FormFields, RawMedia};
use loomcast_core::SizePolicy;
use std::sync::Arc;
use std::time::Duration;

use super::mock_ports::{CallLog, MockBroker, MockExecutor, MockFinalizer, StaticProbe};
use crate::upload::{OrchestratorConfig, RetryPolicy, UploadForm, UploadOrchestrator};

pub const KB: usize = 1024;
pub const MB: usize = 1024 * KB;

/// Zero-filled mp4 of `size` bytes.
pub fn video_file(size: usize) -> RawMedia {
    RawMedia::new("demo.mp4", vec![0u8; size])
}

pub fn thumbnail_file(size: usize) -> RawMedia {
    RawMedia::new("thumb.png", vec![0u8; size])
}

pub fn demo_fields() -> FormFields {
    FormFields::new("Demo", "Demo video")
}

/// A 4 MB video and a 200 KB thumbnail with demo fields, ready to submit.
/// With `probe_duration`, the video duration is probed as that value.
pub fn ready_form(probe_duration: Option<f64>) -> UploadForm {
    let mut form = UploadForm::new(SizePolicy::default()).with_fields(demo_fields());
    if let Some(duration) = probe_duration {
        form = form.with_probe(Arc::new(StaticProbe::new(duration)));
    }
    form.select_video(video_file(4 * MB)).unwrap();
    form.select_thumbnail(thumbnail_file(200 * KB)).unwrap();
    form
}

pub fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        broker_retry: RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(1),
        },
        duration_wait: Duration::from_secs(1),
    }
}

/// Orchestrator wired to mocks sharing one [`CallLog`].
pub struct Harness {
    pub log: CallLog,
    pub broker: Arc<MockBroker>,
    pub executor: Arc<MockExecutor>,
    pub finalizer: Arc<MockFinalizer>,
    pub orchestrator: Arc<UploadOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CallLog::new(), fast_config())
    }

    pub fn with_config(log: CallLog, config: OrchestratorConfig) -> Self {
        Self::build(
            log.clone(),
            MockBroker::new(log.clone()),
            MockExecutor::new(log.clone()),
            MockFinalizer::new(log),
            config,
        )
    }

    pub fn with_mocks(
        log: CallLog,
        broker: MockBroker,
        executor: MockExecutor,
        finalizer: MockFinalizer,
    ) -> Self {
        Self::build(log, broker, executor, finalizer, fast_config())
    }

    fn build(
        log: CallLog,
        broker: MockBroker,
        executor: MockExecutor,
        finalizer: MockFinalizer,
        config: OrchestratorConfig,
    ) -> Self {
        let broker = Arc::new(broker);
        let executor = Arc::new(executor);
        let finalizer = Arc::new(finalizer);
        let orchestrator = Arc::new(UploadOrchestrator::new(
            broker.clone(),
            executor.clone(),
            finalizer.clone(),
            config,
        ));
        Self {
            log,
            broker,
            executor,
            finalizer,
            orchestrator,
        }
    }
}
