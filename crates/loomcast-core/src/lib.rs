//! Loomcast Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the
//! port traits shared by every Loomcast component. It performs no I/O of its own.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{SizePolicy, UploadConfig};
pub use error::{
    BrokerError, ErrorMetadata, FinalizeError, LogLevel, TransferError, UploadError,
    ValidationError,
};
pub use ports::{CredentialBroker, MetadataFinalizer, TransferAck, TransferExecutor};
pub use storage_types::CheckpointBackend;
