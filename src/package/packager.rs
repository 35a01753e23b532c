use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{info, instrument, warn};

use crate::encode::video::EncodedVideo;
use crate::foundation::error::{KissError, KissResult};
use crate::package::upload::Uploader;

/// Note attached when a hosted upload was requested but the inline payload was returned.
pub const UPLOAD_FALLBACK_NOTE: &str = "Upload failed, returned base64 instead";

/// Retention reported for hosted videos unless configured otherwise.
pub const DEFAULT_UPLOAD_TTL: &str = "7 days";

/// Requested delivery of the encoded video.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Base64,
    Url,
}

/// How the video reaches the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoPayload {
    Inline {
        base64: String,
    },
    Hosted {
        url: String,
        filename: String,
        file_size: usize,
        expires_in: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagedVideo {
    pub payload: VideoPayload,
    /// Set when the requested format could not be honored.
    pub note: Option<String>,
}

impl PackagedVideo {
    pub fn is_inline(&self) -> bool {
        matches!(self.payload, VideoPayload::Inline { .. })
    }
}

/// Turns an [`EncodedVideo`] into the response payload.
pub struct Packager {
    uploader: Option<Box<dyn Uploader>>,
    ttl: String,
}

impl Packager {
    /// Inline-only packager; `Url` requests degrade to base64 with a note.
    pub fn inline_only() -> Self {
        Self {
            uploader: None,
            ttl: DEFAULT_UPLOAD_TTL.to_string(),
        }
    }

    pub fn with_uploader(uploader: Box<dyn Uploader>, ttl: impl Into<String>) -> Self {
        Self {
            uploader: Some(uploader),
            ttl: ttl.into(),
        }
    }

    pub fn can_upload(&self) -> bool {
        self.uploader.is_some()
    }

    /// Package `video` in the requested `format`.
    ///
    /// Never fails: upload problems fall back to the inline payload.
    #[instrument(skip_all, fields(format = ?format, size = video.byte_size()))]
    pub fn package(&self, video: &EncodedVideo, format: OutputFormat) -> PackagedVideo {
        let inline = || VideoPayload::Inline {
            base64: encode_base64(video.bytes()),
        };

        if format == OutputFormat::Base64 {
            return PackagedVideo {
                payload: inline(),
                note: None,
            };
        }

        match self.upload(video) {
            Ok(payload) => PackagedVideo {
                payload,
                note: None,
            },
            Err(e) => {
                warn!(error = %e, "upload failed, returning base64");
                PackagedVideo {
                    payload: inline(),
                    note: Some(format!("{UPLOAD_FALLBACK_NOTE} ({e})")),
                }
            }
        }
    }

    fn upload(&self, video: &EncodedVideo) -> KissResult<VideoPayload> {
        let uploader = self
            .uploader
            .as_ref()
            .ok_or_else(|| KissError::upload("no upload endpoint configured"))?;
        let filename = video_filename(video, unix_now());
        let url = uploader.upload(video.bytes(), &filename)?;
        info!(%url, %filename, "video hosted");
        Ok(VideoPayload::Hosted {
            url,
            filename,
            file_size: video.byte_size(),
            expires_in: self.ttl.clone(),
        })
    }
}

/// Standard base64 of `bytes`.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// `kiss_video_<unix_ts>_<8 hex>.mp4`, the hex part derived from the video content.
pub fn video_filename(video: &EncodedVideo, unix_ts: u64) -> String {
    format!(
        "kiss_video_{unix_ts}_{:08x}.mp4",
        video.fingerprint() & 0xffff_ffff
    )
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/package/packager.rs"]
mod tests;
