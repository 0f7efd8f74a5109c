//! Persists the final asset record through the backend metadata endpoint.

use async_trait::async_trait;
use loomcast_core::models::{AssetRecord, FormFields};
use loomcast_core::{FinalizeError, MetadataFinalizer};

use crate::{ApiClient, RequestError};

/// Writes the record with one `POST /videos`. The backend applies it atomically.
#[derive(Clone, Debug)]
pub struct HttpMetadataFinalizer {
    api: ApiClient,
}

impl HttpMetadataFinalizer {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MetadataFinalizer for HttpMetadataFinalizer {
    async fn finalize(
        &self,
        video_id: &str,
        thumbnail_cdn_url: &str,
        duration: Option<f64>,
        fields: &FormFields,
    ) -> Result<AssetRecord, FinalizeError> {
        let record = AssetRecord::new(video_id, thumbnail_cdn_url, duration, fields);

        self.api
            .post_json_no_content("/videos", &record)
            .await
            .map_err(|e| match e {
                RequestError::Unreachable(msg) => {
                    FinalizeError::PersistFailed(format!("backend unreachable: {}", msg))
                }
                RequestError::Status { status, body } => {
                    FinalizeError::PersistFailed(format!("status {}: {}", status, body))
                }
                RequestError::Decode(msg) => FinalizeError::PersistFailed(msg),
            })?;

        tracing::info!(video_id = %video_id, "Asset record persisted");
        Ok(record)
    }
}
