use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stage of an orchestration attempt.
///
/// Stages are entered strictly in declaration order from `Validating` to `Done`.
/// A validation failure goes back to `Idle`; any later failure ends in `Failed`.
/// `Done` and `Failed` return to `Idle` when the next attempt starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Idle,
    Validating,
    RequestingVideoCredential,
    UploadingVideo,
    RequestingThumbnailCredential,
    UploadingThumbnail,
    Finalizing,
    Done,
    Failed,
}

impl UploadState {
    /// An attempt is running and a new submit must be refused.
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            UploadState::Idle | UploadState::Done | UploadState::Failed
        )
    }

    /// The single successor on the happy path.
    pub fn next(&self) -> Option<UploadState> {
        use UploadState::*;
        match self {
            Idle => Some(Validating),
            Validating => Some(RequestingVideoCredential),
            RequestingVideoCredential => Some(UploadingVideo),
            UploadingVideo => Some(RequestingThumbnailCredential),
            RequestingThumbnailCredential => Some(UploadingThumbnail),
            UploadingThumbnail => Some(Finalizing),
            Finalizing => Some(Done),
            Done | Failed => None,
        }
    }

    pub fn can_transition_to(&self, next: UploadState) -> bool {
        use UploadState::*;
        if self.next() == Some(next) {
            return true;
        }
        match (self, next) {
            (Validating, Idle) => true,
            (Done | Failed, Idle) => true,
            (
                RequestingVideoCredential
                | UploadingVideo
                | RequestingThumbnailCredential
                | UploadingThumbnail
                | Finalizing,
                Failed,
            ) => true,
            _ => false,
        }
    }
}

impl Display for UploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadState::Idle => "idle",
            UploadState::Validating => "validating",
            UploadState::RequestingVideoCredential => "requesting_video_credential",
            UploadState::UploadingVideo => "uploading_video",
            UploadState::RequestingThumbnailCredential => "requesting_thumbnail_credential",
            UploadState::UploadingThumbnail => "uploading_thumbnail",
            UploadState::Finalizing => "finalizing",
            UploadState::Done => "done",
            UploadState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
