//! Data models for the upload pipeline
//!
//! Each sub-module covers one record of the pipeline: the selected media, the
//! short-lived upload credential, the recorder checkpoint and the final asset.

mod asset;
mod checkpoint;
mod credential;
mod media;

// Re-export all models for convenient imports
pub use asset::*;
pub use checkpoint::*;
pub use credential::*;
pub use media::*;
