//! Ports the orchestrator calls into.
//!
//! The HTTP implementations live in `loomcast-api-client`; tests substitute
//! in-memory ones.

use async_trait::async_trait;

use crate::error::{BrokerError, FinalizeError, TransferError};
use crate::models::{AssetRecord, FormFields, MediaPayload, UploadCredential};

/// Issues single-use upload credentials. One round trip per call, no retries.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn request_video_credential(&self) -> Result<UploadCredential, BrokerError>;

    /// Only valid once `video_id` has been issued by [`request_video_credential`](Self::request_video_credential).
    async fn request_thumbnail_credential(
        &self,
        video_id: &str,
    ) -> Result<UploadCredential, BrokerError>;
}

/// Acknowledgement of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferAck {
    pub status: u16,
}

/// Sends a payload as one authenticated write. Stateless between calls.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn transfer(
        &self,
        credential: UploadCredential,
        payload: &MediaPayload,
    ) -> Result<TransferAck, TransferError>;
}

/// Persists the asset record in a single all-or-nothing write.
#[async_trait]
pub trait MetadataFinalizer: Send + Sync {
    /// Caller guarantees both transfers for `video_id` were acknowledged.
    async fn finalize(
        &self,
        video_id: &str,
        thumbnail_cdn_url: &str,
        duration: Option<f64>,
        fields: &FormFields,
    ) -> Result<AssetRecord, FinalizeError>;
}
