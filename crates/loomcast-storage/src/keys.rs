//! Shared key handling for checkpoint backends.

use crate::traits::{StorageError, StorageResult};

/// Validate a checkpoint key. All backends apply the same rules.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey("Key must not be empty".to_string()));
    }
    if key.contains("..") || key.contains('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}

/// Filename the filesystem backend uses for `key`.
pub fn key_to_filename(key: &str) -> String {
    format!("{}.json", urlencoding::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        assert!(validate_key("recordedVideo").is_ok());
        assert_eq!(key_to_filename("recordedVideo"), "recordedVideo.json");
    }

    #[test]
    fn rejects_traversal_and_empty() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[test]
    fn encodes_unusual_characters() {
        assert_eq!(key_to_filename("my key"), "my%20key.json");
    }
}
