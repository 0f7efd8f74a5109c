//! Test helpers for orchestrator unit tests
//!
//! In-memory implementations of the pipeline ports plus fixtures, so the
//! orchestration logic can be exercised without a backend or origin storage.

pub mod fixtures;
pub mod mock_ports;

pub use fixtures::*;
pub use mock_ports::*;
