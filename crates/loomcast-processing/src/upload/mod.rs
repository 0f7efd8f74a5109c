//! Upload pipeline: select → recover → request credentials → transfer → finalize.

pub mod orchestrator;
pub mod probe;
pub mod recovery;
pub mod retry;
pub mod selector;
pub mod state;

pub use orchestrator::{OrchestratorConfig, UploadFailure, UploadForm, UploadOrchestrator};
pub use probe::{DurationProbe, FfprobeDurationProbe};
pub use recovery::SessionRecoveryAgent;
pub use retry::RetryPolicy;
pub use selector::{DurationHandle, MediaSelection, MediaSelector, PreviewRef};
pub use state::UploadState;
