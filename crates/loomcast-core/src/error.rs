//! Error types module
//!
//! The pipeline's error taxonomy. Each component has its own error enum; the
//! orchestrator surfaces them unchanged through [`UploadError`] so the caller
//! can tell which stage failed and why.

use crate::models::MediaKind;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like unreachable services
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported and whether it may be retried.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "SIZE_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same call may succeed
    fn is_recoverable(&self) -> bool;

    /// Message suitable for showing to the user
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Local validation failures. No network call is attempted when one is raised.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} too large: {size} bytes (max: {max} bytes)")]
    SizeExceeded { kind: MediaKind, size: u64, max: u64 },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty file: {0}")]
    EmptyFile(String),

    #[error("Unsupported content type for {kind}: {content_type}")]
    UnsupportedType {
        kind: MediaKind,
        content_type: String,
    },
}

/// Credential request failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrokerError {
    /// The response lacked a usable target URL, token or identifier.
    #[error("Missing upload credential: {0}")]
    MissingCredential(String),

    #[error("Credential request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Credential endpoint unreachable: {0}")]
    Unreachable(String),
}

impl BrokerError {
    /// Network failures and 5xx responses may succeed on a fresh request.
    pub fn is_transient(&self) -> bool {
        match self {
            BrokerError::Unreachable(_) => true,
            BrokerError::Rejected { status, .. } => *status >= 500,
            BrokerError::MissingCredential(_) => false,
        }
    }
}

/// Binary transfer failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransferError {
    #[error("Upload rejected with status {status}: {message}")]
    UploadRejected { status: u16, message: String },

    #[error("Origin storage unreachable: {0}")]
    Unreachable(String),
}

/// Metadata persistence failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FinalizeError {
    #[error("Failed to persist asset record: {0}")]
    PersistFailed(String),
}

/// Any error that aborts an orchestration attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    /// A submit arrived while another attempt was still running.
    #[error("An upload attempt is already in progress")]
    AttemptInProgress,
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (&'static str, bool, LogLevel) {
    match err {
        UploadError::Validation(ValidationError::SizeExceeded { .. }) => {
            ("SIZE_EXCEEDED", false, LogLevel::Debug)
        }
        UploadError::Validation(ValidationError::MissingField(_)) => {
            ("MISSING_FIELD", false, LogLevel::Debug)
        }
        UploadError::Validation(ValidationError::EmptyFile(_)) => {
            ("EMPTY_FILE", false, LogLevel::Debug)
        }
        UploadError::Validation(ValidationError::UnsupportedType { .. }) => {
            ("UNSUPPORTED_TYPE", false, LogLevel::Debug)
        }
        UploadError::Broker(BrokerError::MissingCredential(_)) => {
            ("MISSING_CREDENTIAL", false, LogLevel::Error)
        }
        UploadError::Broker(e @ BrokerError::Rejected { .. }) => {
            ("CREDENTIAL_REJECTED", e.is_transient(), LogLevel::Error)
        }
        UploadError::Broker(BrokerError::Unreachable(_)) => {
            ("CREDENTIAL_UNREACHABLE", true, LogLevel::Warn)
        }
        UploadError::Transfer(TransferError::UploadRejected { .. }) => {
            ("UPLOAD_REJECTED", false, LogLevel::Error)
        }
        UploadError::Transfer(TransferError::Unreachable(_)) => {
            ("STORAGE_UNREACHABLE", true, LogLevel::Warn)
        }
        UploadError::Finalize(FinalizeError::PersistFailed(_)) => {
            ("PERSIST_FAILED", true, LogLevel::Error)
        }
        UploadError::AttemptInProgress => ("ATTEMPT_IN_PROGRESS", true, LogLevel::Debug),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(ValidationError::MissingField(field)) => match field.as_str()
            {
                "video" | "thumbnail" => "Please upload a video and a thumbnail".to_string(),
                _ => "Please fill in all the fields".to_string(),
            },
            UploadError::Validation(e) => e.to_string(),
            UploadError::Broker(_) => "Failed to get upload credentials".to_string(),
            UploadError::Transfer(_) => "Failed to upload file to storage".to_string(),
            UploadError::Finalize(_) => "Failed to save video details".to_string(),
            UploadError::AttemptInProgress => "An upload is already in progress".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_size_exceeded() {
        let err = UploadError::from(ValidationError::SizeExceeded {
            kind: MediaKind::Video,
            size: 600,
            max: 500,
        });
        assert_eq!(err.error_code(), "SIZE_EXCEEDED");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.client_message().contains("600"));
    }

    #[test]
    fn test_error_metadata_missing_files() {
        let err = UploadError::from(ValidationError::MissingField("thumbnail".to_string()));
        assert_eq!(err.client_message(), "Please upload a video and a thumbnail");

        let err = UploadError::from(ValidationError::MissingField("title".to_string()));
        assert_eq!(err.client_message(), "Please fill in all the fields");
    }

    #[test]
    fn test_broker_transience() {
        assert!(BrokerError::Unreachable("timeout".to_string()).is_transient());
        assert!(BrokerError::Rejected {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!BrokerError::Rejected {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!BrokerError::MissingCredential("uploadUrl".to_string()).is_transient());
    }

    #[test]
    fn test_error_metadata_transfer() {
        let err = UploadError::from(TransferError::UploadRejected {
            status: 403,
            message: "forbidden".to_string(),
        });
        assert_eq!(err.error_code(), "UPLOAD_REJECTED");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);

        let err = UploadError::from(TransferError::Unreachable("reset".to_string()));
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }
}
