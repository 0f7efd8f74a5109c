use std::fmt;

use super::media::MediaKind;

/// Short-lived target URL and access token authorizing exactly one transfer.
///
/// Not `Clone`: a transfer consumes the credential, so it cannot be reused.
pub struct UploadCredential {
    kind: MediaKind,
    upload_url: String,
    access_key: String,
    video_id: String,
    cdn_url: Option<String>,
}

impl UploadCredential {
    /// Credential for the video transfer. `video_id` is the remote identifier it issued.
    pub fn video(video_id: String, upload_url: String, access_key: String) -> Self {
        Self {
            kind: MediaKind::Video,
            upload_url,
            access_key,
            video_id,
            cdn_url: None,
        }
    }

    /// Credential for the thumbnail transfer, bound to a previously issued video id.
    pub fn thumbnail(
        video_id: String,
        upload_url: String,
        access_key: String,
        cdn_url: String,
    ) -> Self {
        Self {
            kind: MediaKind::Image,
            upload_url,
            access_key,
            video_id,
            cdn_url: Some(cdn_url),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// CDN URL the thumbnail will be served from. Only set for thumbnail credentials.
    pub fn cdn_url(&self) -> Option<&str> {
        self.cdn_url.as_deref()
    }
}

impl fmt::Debug for UploadCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCredential")
            .field("kind", &self.kind)
            .field("upload_url", &self.upload_url)
            .field("access_key", &"<redacted>")
            .field("video_id", &self.video_id)
            .field("cdn_url", &self.cdn_url)
            .finish()
    }
}
