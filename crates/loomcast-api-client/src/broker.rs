//! Credential broker backed by the backend credential endpoints.

use async_trait::async_trait;
use loomcast_core::models::UploadCredential;
use loomcast_core::{BrokerError, CredentialBroker};
use serde::Deserialize;

use crate::{ApiClient, RequestError};

/// `POST /videos/upload-credentials` response. Fields are optional so a shape
/// mismatch surfaces as `MissingCredential` instead of a decode error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoCredentialResponse {
    video_id: Option<String>,
    upload_url: Option<String>,
    access_key: Option<String>,
}

/// `POST /videos/{videoId}/thumbnail-credentials` response. `videoId` is the
/// video the backend bound the credential to, when it echoes one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailCredentialResponse {
    video_id: Option<String>,
    upload_url: Option<String>,
    access_key: Option<String>,
    cdn_url: Option<String>,
}

/// Collects required fields, recording which ones were absent or blank.
struct Required<'a> {
    missing: Vec<&'a str>,
}

impl<'a> Required<'a> {
    fn new() -> Self {
        Self {
            missing: Vec::new(),
        }
    }

    fn take(&mut self, name: &'a str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), BrokerError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(BrokerError::MissingCredential(self.missing.join(", ")))
        }
    }
}

fn map_request_error(err: RequestError) -> BrokerError {
    match err {
        RequestError::Unreachable(msg) => BrokerError::Unreachable(msg),
        RequestError::Status { status, body } => BrokerError::Rejected {
            status,
            message: body,
        },
        RequestError::Decode(msg) => {
            BrokerError::MissingCredential(format!("unreadable response: {}", msg))
        }
    }
}

/// Requests upload credentials from the trusted backend. Performs no retries.
#[derive(Clone, Debug)]
pub struct HttpCredentialBroker {
    api: ApiClient,
}

impl HttpCredentialBroker {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CredentialBroker for HttpCredentialBroker {
    async fn request_video_credential(&self) -> Result<UploadCredential, BrokerError> {
        let response: VideoCredentialResponse = self
            .api
            .post_json("/videos/upload-credentials", &serde_json::json!({}))
            .await
            .map_err(map_request_error)?;

        let mut required = Required::new();
        let video_id = required.take("videoId", response.video_id);
        let upload_url = required.take("uploadUrl", response.upload_url);
        let access_key = required.take("accessKey", response.access_key);
        required.finish()?;

        tracing::debug!(video_id = %video_id, "Video upload credential issued");
        Ok(UploadCredential::video(video_id, upload_url, access_key))
    }

    async fn request_thumbnail_credential(
        &self,
        video_id: &str,
    ) -> Result<UploadCredential, BrokerError> {
        let path = format!(
            "/videos/{}/thumbnail-credentials",
            urlencoding::encode(video_id)
        );
        let response: ThumbnailCredentialResponse = self
            .api
            .post_json(&path, &serde_json::json!({}))
            .await
            .map_err(map_request_error)?;

        let mut required = Required::new();
        let upload_url = required.take("uploadUrl", response.upload_url);
        let access_key = required.take("accessKey", response.access_key);
        let cdn_url = required.take("cdnUrl", response.cdn_url);
        required.finish()?;

        let bound_video_id = response
            .video_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| video_id.to_string());

        tracing::debug!(video_id = %bound_video_id, "Thumbnail upload credential issued");
        Ok(UploadCredential::thumbnail(
            bound_video_id,
            upload_url,
            access_key,
            cdn_url,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use loomcast_core::models::MediaKind;
    use std::time::Duration;

    fn broker_for(url: &str) -> HttpCredentialBroker {
        let api = ApiClient::new(
            url.to_string(),
            "/api/v1".to_string(),
            Auth::XApiKey("test-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        HttpCredentialBroker::new(api)
    }

    #[tokio::test]
    async fn test_video_credential_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/videos/upload-credentials")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"videoId":"vid-1","uploadUrl":"https://storage.example.com/vid-1","accessKey":"ak"}"#,
            )
            .create_async()
            .await;

        let credential = broker_for(&server.url())
            .request_video_credential()
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(credential.kind(), MediaKind::Video);
        assert_eq!(credential.video_id(), "vid-1");
        assert_eq!(credential.upload_url(), "https://storage.example.com/vid-1");
        assert_eq!(credential.access_key(), "ak");
        assert_eq!(credential.cdn_url(), None);
    }

    #[tokio::test]
    async fn test_video_credential_missing_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/videos/upload-credentials")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"videoId":"vid-1","uploadUrl":""}"#)
            .create_async()
            .await;

        let err = broker_for(&server.url())
            .request_video_credential()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BrokerError::MissingCredential("uploadUrl, accessKey".to_string())
        );
    }

    #[tokio::test]
    async fn test_thumbnail_credential_keyed_by_video_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/videos/vid-1/thumbnail-credentials")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"uploadUrl":"https://storage.example.com/thumbs/vid-1","accessKey":"tk","cdnUrl":"https://cdn.example.com/thumbs/vid-1"}"#,
            )
            .create_async()
            .await;

        let credential = broker_for(&server.url())
            .request_thumbnail_credential("vid-1")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(credential.kind(), MediaKind::Image);
        assert_eq!(credential.video_id(), "vid-1");
        assert_eq!(
            credential.cdn_url(),
            Some("https://cdn.example.com/thumbs/vid-1")
        );
    }

    #[tokio::test]
    async fn test_thumbnail_credential_keeps_echoed_video_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/videos/vid-1/thumbnail-credentials")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"videoId":"vid-2","uploadUrl":"https://storage.example.com/t","accessKey":"tk","cdnUrl":"https://cdn.example.com/t"}"#,
            )
            .create_async()
            .await;

        let credential = broker_for(&server.url())
            .request_thumbnail_credential("vid-1")
            .await
            .unwrap();
        assert_eq!(credential.video_id(), "vid-2");
    }

    #[tokio::test]
    async fn test_thumbnail_credential_missing_cdn_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/videos/vid-1/thumbnail-credentials")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uploadUrl":"https://storage.example.com/t","accessKey":"tk"}"#)
            .create_async()
            .await;

        let err = broker_for(&server.url())
            .request_thumbnail_credential("vid-1")
            .await
            .unwrap_err();
        assert_eq!(err, BrokerError::MissingCredential("cdnUrl".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/videos/upload-credentials")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = broker_for(&server.url())
            .request_video_credential()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BrokerError::Rejected {
                status: 503,
                message: "maintenance".to_string()
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_non_json_body_is_missing_credential() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/videos/upload-credentials")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = broker_for(&server.url())
            .request_video_credential()
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let err = broker_for("http://127.0.0.1:1")
            .request_video_credential()
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Unreachable(_)));
    }
}
