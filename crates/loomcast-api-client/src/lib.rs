//! HTTP client for the Loomcast backend.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key)
//! and the HTTP implementations of the pipeline ports: the credential broker,
//! the origin-storage transfer executor and the metadata finalizer.

pub mod broker;
pub mod finalizer;
pub mod transfer;

use anyhow::{Context, Result};
use loomcast_core::UploadConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use broker::HttpCredentialBroker;
pub use finalizer::HttpMetadataFinalizer;
pub use transfer::HttpTransferExecutor;

/// Authentication strategy for the API. Treated as an opaque capability.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// Failure of a single backend round trip, before it is mapped to a component error.
#[derive(Debug)]
pub(crate) enum RequestError {
    /// No response was received.
    Unreachable(String),
    /// A response arrived with a non-success status.
    Status { status: u16, body: String },
    /// A success response whose body could not be decoded.
    Decode(String),
}

/// HTTP client for the Loomcast backend with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, api_prefix: String, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix,
            auth,
        })
    }

    /// Create client from configuration. Uses X-API-Key auth.
    pub fn from_config(config: &UploadConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("Missing API key. Set LOOMCAST_API_KEY or API_KEY")?;

        Self::new(
            config.api_url.clone(),
            config.api_prefix(),
            Auth::XApiKey(api_key),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL for a path below the API prefix (e.g. "/videos").
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// POST a JSON body and deserialize the JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request
            .send()
            .await
            .map_err(|e| RequestError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// POST a JSON body, ignoring the response body. Returns Ok(()) on success.
    pub(crate) async fn post_json_no_content<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RequestError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request
            .send()
            .await
            .map_err(|e| RequestError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_prefix() {
        let client = ApiClient::new(
            "http://localhost:3000/".to_string(),
            "/api/v1".to_string(),
            Auth::XApiKey("key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.build_url("/videos"),
            "http://localhost:3000/api/v1/videos"
        );
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = UploadConfig::default();
        assert!(ApiClient::from_config(&config).is_err());

        let config = UploadConfig {
            api_key: Some("key".to_string()),
            ..UploadConfig::default()
        };
        assert!(ApiClient::from_config(&config).is_ok());
    }
}
