use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Checkpoint store backend types
///
/// Defined in core because it is selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// JSON files under the session directory; shared with an out-of-band recorder process.
    Local,
    /// Process-local map; lost on exit.
    Memory,
}

impl FromStr for CheckpointBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(CheckpointBackend::Local),
            "memory" => Ok(CheckpointBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid checkpoint backend: {}", s)),
        }
    }
}

impl Display for CheckpointBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CheckpointBackend::Local => write!(f, "local"),
            CheckpointBackend::Memory => write!(f, "memory"),
        }
    }
}
