use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(anyhow::anyhow!("Invalid visibility: {}", s)),
        }
    }
}

/// User-entered form fields submitted alongside the two files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct FormFields {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub title: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl FormFields {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            visibility: Visibility::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Catalogued asset persisted once both transfers have been acknowledged.
///
/// Serialized with camelCase keys: this is also the body sent to the
/// metadata-persistence endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub thumbnail_url: String,
    /// Playback duration in seconds, if it was known at finalization.
    pub duration: Option<f64>,
}

impl AssetRecord {
    pub fn new(
        video_id: impl Into<String>,
        thumbnail_url: impl Into<String>,
        duration: Option<f64>,
        fields: &FormFields,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            visibility: fields.visibility,
            thumbnail_url: thumbnail_url.into(),
            duration,
        }
    }
}
