//! Configuration module
//!
//! Environment-driven settings for the backend client, the size policy, the
//! orchestrator's retry budget and the checkpoint store.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::MediaKind;
use crate::storage_types::CheckpointBackend;

// Common constants
const API_URL: &str = "http://localhost:3000";
const API_VERSION: &str = "v1";
const MAX_VIDEO_SIZE_MB: u64 = 500;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const TRANSFER_TIMEOUT_SECS: u64 = 3600;
const BROKER_MAX_ATTEMPTS: u32 = 3;
const BROKER_RETRY_BACKOFF_MS: u64 = 500;
const DURATION_WAIT_MS: u64 = 5000;

/// Independent byte-size maxima per media kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizePolicy {
    pub max_video_bytes: u64,
    pub max_image_bytes: u64,
}

impl SizePolicy {
    pub fn max_for(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Video => self.max_video_bytes,
            MediaKind::Image => self.max_image_bytes,
        }
    }
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            max_video_bytes: mb_to_bytes(MAX_VIDEO_SIZE_MB),
            max_image_bytes: mb_to_bytes(MAX_THUMBNAIL_SIZE_MB),
        }
    }
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub api_url: String,
    /// Opaque capability for the backend. Optional here; the CLI client requires it.
    pub api_key: Option<String>,
    pub api_version: String,
    pub size_policy: SizePolicy,
    pub request_timeout_secs: u64,
    pub transfer_timeout_secs: u64,
    pub broker_max_attempts: u32,
    pub broker_retry_backoff_ms: u64,
    pub duration_wait_ms: u64,
    pub ffprobe_path: String,
    pub checkpoint_backend: CheckpointBackend,
    pub session_dir: PathBuf,
    pub environment: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            api_key: None,
            api_version: API_VERSION.to_string(),
            size_policy: SizePolicy::default(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            transfer_timeout_secs: TRANSFER_TIMEOUT_SECS,
            broker_max_attempts: BROKER_MAX_ATTEMPTS,
            broker_retry_backoff_ms: BROKER_RETRY_BACKOFF_MS,
            duration_wait_ms: DURATION_WAIT_MS,
            ffprobe_path: "ffprobe".to_string(),
            checkpoint_backend: CheckpointBackend::Local,
            session_dir: default_session_dir(),
            environment: "development".to_string(),
        }
    }
}

fn default_session_dir() -> PathBuf {
    env::temp_dir().join("loomcast-session")
}

/// Megabytes to bytes, clamped at `u64::MAX`.
fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let checkpoint_backend = match env::var("CHECKPOINT_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => CheckpointBackend::Local,
        };

        let config = UploadConfig {
            api_url: env::var("LOOMCAST_API_URL")
                .or_else(|_| env::var("API_URL"))
                .unwrap_or_else(|_| API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: env::var("LOOMCAST_API_KEY")
                .or_else(|_| env::var("API_KEY"))
                .ok(),
            api_version: env::var("LOOMCAST_API_VERSION")
                .unwrap_or_else(|_| API_VERSION.to_string()),
            size_policy: SizePolicy {
                max_video_bytes: mb_to_bytes(env_or("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB)),
                max_image_bytes: mb_to_bytes(env_or(
                    "MAX_THUMBNAIL_SIZE_MB",
                    MAX_THUMBNAIL_SIZE_MB,
                )),
            },
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS),
            transfer_timeout_secs: env_or("TRANSFER_TIMEOUT_SECS", TRANSFER_TIMEOUT_SECS),
            broker_max_attempts: env_or("BROKER_MAX_ATTEMPTS", BROKER_MAX_ATTEMPTS),
            broker_retry_backoff_ms: env_or("BROKER_RETRY_BACKOFF_MS", BROKER_RETRY_BACKOFF_MS),
            duration_wait_ms: env_or("DURATION_WAIT_MS", DURATION_WAIT_MS),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            checkpoint_backend,
            session_dir: env::var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_session_dir()),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "LOOMCAST_API_URL must be an http(s) URL, got {}",
                self.api_url
            ));
        }
        if self.size_policy.max_video_bytes == 0 || self.size_policy.max_image_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_VIDEO_SIZE_MB and MAX_THUMBNAIL_SIZE_MB must be greater than zero"
            ));
        }
        if self.broker_max_attempts == 0 {
            return Err(anyhow::anyhow!("BROKER_MAX_ATTEMPTS must be at least 1"));
        }
        if self.is_production() && self.api_url.starts_with("http://") {
            return Err(anyhow::anyhow!(
                "LOOMCAST_API_URL must use https in production"
            ));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// API path prefix (e.g. "/api/v1").
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn broker_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.broker_retry_backoff_ms)
    }

    pub fn duration_wait(&self) -> Duration {
        Duration::from_millis(self.duration_wait_ms)
    }
}
