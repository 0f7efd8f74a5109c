//! Loomcast Storage Library
//!
//! Transient, session-scoped storage used by the recovery flow: a key/value
//! checkpoint store and a source of ephemeral recorded blobs.
//!
//! # Checkpoint key format
//!
//! Keys are short identifiers such as `recordedVideo`. They must not be empty and
//! must not contain `..`, `/` or `\`. The filesystem backend stores each entry as
//! `{session_dir}/checkpoints/{percent-encoded key}.json`.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::{blob_dir, checkpoint_dir, create_session_storage, SessionStorage};
pub use local::{LocalBlobSource, LocalCheckpointStore};
pub use loomcast_core::CheckpointBackend;
pub use memory::{MemoryBlobSource, MemoryCheckpointStore};
pub use traits::{BlobSource, CheckpointStore, StorageError, StorageResult};
