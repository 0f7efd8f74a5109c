//! Loomcast Processing Library
//!
//! Client-side upload pipeline: media selection with size policy and duration
//! probing, recovery of recorded sessions, and the orchestrator that drives the
//! credential broker, transfer executor and metadata finalizer in order.

pub mod upload;

#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used types
pub use upload::{
    DurationHandle, DurationProbe, FfprobeDurationProbe, MediaSelection, MediaSelector,
    OrchestratorConfig, RetryPolicy, SessionRecoveryAgent, UploadFailure, UploadForm,
    UploadOrchestrator, UploadState,
};
