//! Authenticated binary transfer to the origin-storage service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use loomcast_core::models::{MediaPayload, UploadCredential};
use loomcast_core::{TransferAck, TransferError, TransferExecutor};
use reqwest::Client;
use std::time::Duration;

/// Header carrying the credential's access token on the storage write.
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

/// Sends each payload as the full body of a single `PUT`.
///
/// Stateless between calls; the credential is consumed by [`transfer`](TransferExecutor::transfer).
#[derive(Clone, Debug)]
pub struct HttpTransferExecutor {
    client: Client,
}

impl HttpTransferExecutor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TransferExecutor for HttpTransferExecutor {
    async fn transfer(
        &self,
        credential: UploadCredential,
        payload: &MediaPayload,
    ) -> Result<TransferAck, TransferError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .put(credential.upload_url())
            .header(reqwest::header::CONTENT_TYPE, payload.content_type.as_str())
            .header(ACCESS_KEY_HEADER, credential.access_key())
            .body(payload.data.clone())
            .send()
            .await
            .map_err(|e| TransferError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransferError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(
            kind = %credential.kind(),
            video_id = %credential.video_id(),
            size = payload.size(),
            duration_ms = start.elapsed().as_millis(),
            "Transfer acknowledged"
        );

        Ok(TransferAck {
            status: status.as_u16(),
        })
    }
}
