use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// Kind of asset a file is selected as. Each kind has its own size maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// MIME top-level type accepted for this kind (`video/*`, `image/*`).
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/",
            MediaKind::Image => "image/",
        }
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        content_type.to_lowercase().starts_with(self.mime_prefix())
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Image => write!(f, "image"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "image" | "thumbnail" => Ok(MediaKind::Image),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// A file-like payload as picked by the user, before any policy is applied.
#[derive(Debug, Clone)]
pub struct RawMedia {
    pub name: String,
    /// Declared MIME type. Derived from the filename extension when absent.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl RawMedia {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// The binary part of an accepted selection: exactly what gets transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl MediaPayload {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Map a filename extension to the MIME type the origin storage should receive.
pub fn content_type_for_filename(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let content_type = match extension.as_str() {
        // Videos
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "m4v" => "video/x-m4v",
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => return None,
    };

    Some(content_type)
}
