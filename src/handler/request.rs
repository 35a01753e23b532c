use serde::Deserialize;

use crate::foundation::error::{KissError, KissResult};
use crate::package::packager::OutputFormat;

/// One job as delivered by the queue: `{ "id": ..., "input": { ... } }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub input: JobInput,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct JobInput {
    /// Raw base64, data URL, or http(s) URL.
    pub source_image: Option<String>,
    /// data URL or http(s) URL.
    pub source_image_url: Option<String>,
    pub target_image: Option<String>,
    pub target_image_url: Option<String>,
    pub output_format: OutputFormat,
    pub num_frames: Option<u32>,
    pub fps: Option<u32>,
    pub use_ai: bool,
    pub health_check: bool,
}

impl Default for JobInput {
    fn default() -> Self {
        Self {
            source_image: None,
            source_image_url: None,
            target_image: None,
            target_image_url: None,
            output_format: OutputFormat::default(),
            num_frames: None,
            fps: None,
            use_ai: true,
            health_check: false,
        }
    }
}

/// A request image reference plus whether bare base64 is acceptable for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub raw: &'a str,
    pub allow_raw_base64: bool,
}

impl JobInput {
    /// Resolve `(source, target)` references; the non-`_url` field wins when both are set.
    pub fn image_refs(&self) -> KissResult<(ImageRef<'_>, ImageRef<'_>)> {
        let source = pick(self.source_image.as_deref(), self.source_image_url.as_deref());
        let target = pick(self.target_image.as_deref(), self.target_image_url.as_deref());
        match (source, target) {
            (Some(s), Some(t)) => Ok((s, t)),
            _ => Err(KissError::invalid_input(
                "both source_image and target_image (or their *_url variants) are required",
            )),
        }
    }

    /// Requested frame count, checked against `2..=max`.
    pub fn frame_count_or(&self, default: u32, max: u32) -> KissResult<u32> {
        match self.num_frames {
            Some(n) if n < 2 => Err(KissError::invalid_input(format!(
                "num_frames must be >= 2, got {n}"
            ))),
            Some(n) if n > max => Err(KissError::invalid_input(format!(
                "num_frames must be <= {max}, got {n}"
            ))),
            Some(n) => Ok(n),
            None => Ok(default),
        }
    }

    pub fn fps_or(&self, default: u32) -> KissResult<u32> {
        match self.fps {
            Some(0) => Err(KissError::invalid_input("fps must be > 0")),
            Some(f) => Ok(f),
            None => Ok(default),
        }
    }
}

fn pick<'a>(inline: Option<&'a str>, url: Option<&'a str>) -> Option<ImageRef<'a>> {
    let non_empty = |s: &&str| !s.trim().is_empty();
    if let Some(raw) = inline.filter(non_empty) {
        return Some(ImageRef {
            raw,
            allow_raw_base64: true,
        });
    }
    url.filter(non_empty).map(|raw| ImageRef {
        raw,
        allow_raw_base64: false,
    })
}
