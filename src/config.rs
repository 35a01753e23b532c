//! Handler configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::foundation::core::Resolution;
use crate::foundation::error::{KissError, KissResult};
use crate::model::generate::DEFAULT_AI_FRAME_COUNT;
use crate::package::packager::DEFAULT_UPLOAD_TTL;
use crate::render::pipeline::{DEFAULT_FPS, DEFAULT_FRAME_COUNT, MAX_FRAME_COUNT};

pub const DEFAULT_MODEL_NAME: &str = "Wan2.1-I2V-14B-720P";
pub const DEFAULT_LORA_NAME: &str = "kissing-lora";
pub const DEFAULT_CACHE_DIR: &str = "/runpod-volume/models";
pub const DEFAULT_TARGET_SIZE: u32 = 512;

/// Everything a [`crate::Handler`] needs besides the request itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// Mounted model cache (`MODEL_CACHE_DIR`).
    pub cache_dir: PathBuf,
    /// Scratch directory for encoder output (`TEMP_DIR`).
    pub temp_dir: PathBuf,
    /// Base model directory name under the cache (`MODEL_NAME`).
    pub model_name: String,
    /// Optional LoRA directory name under the cache (`LORA_NAME`, empty disables).
    pub lora_name: Option<String>,
    /// Inference service URL (`INFERENCE_URL`). Without it the AI path is unavailable.
    pub inference_url: Option<String>,
    pub inference_timeout: Duration,
    /// Upload endpoint for `output_format: "url"` (`UPLOAD_URL`).
    pub upload_url: Option<String>,
    /// Retention reported as `expires_in` (`UPLOAD_TTL`).
    pub upload_ttl: String,
    pub upload_timeout: Duration,
    /// Fallback frame count (`FRAME_COUNT`).
    pub frame_count: u32,
    /// AI path frame count (`AI_FRAME_COUNT`).
    pub ai_frame_count: u32,
    /// Largest `num_frames` a request may ask for (`MAX_FRAMES`), at most [`MAX_FRAME_COUNT`].
    pub max_frames: u32,
    /// Output frame rate (`FPS`).
    pub fps: u32,
    /// Square output side in pixels (`TARGET_SIZE`).
    pub target_size: u32,
    /// Image download timeout.
    pub fetch_timeout: Duration,
    /// Attempts at the morphing fallback before giving up.
    pub fallback_attempts: u32,
    /// `ffmpeg` binary used by the encoder.
    pub ffmpeg: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            temp_dir: std::env::temp_dir(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            lora_name: Some(DEFAULT_LORA_NAME.to_string()),
            inference_url: None,
            inference_timeout: Duration::from_secs(120),
            upload_url: None,
            upload_ttl: DEFAULT_UPLOAD_TTL.to_string(),
            upload_timeout: Duration::from_secs(30),
            frame_count: DEFAULT_FRAME_COUNT,
            ai_frame_count: DEFAULT_AI_FRAME_COUNT,
            max_frames: MAX_FRAME_COUNT,
            fps: DEFAULT_FPS,
            target_size: DEFAULT_TARGET_SIZE,
            fetch_timeout: Duration::from_secs(30),
            fallback_attempts: 2,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl HandlerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`HandlerConfig::from_env`] but reading variables through `get`.
    ///
    /// Unparsable numbers keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let text = |key: &str| get(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let number = |key: &str, default: u32| {
            text(key)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(default)
        };

        Self {
            cache_dir: text("MODEL_CACHE_DIR").map(PathBuf::from).unwrap_or(d.cache_dir),
            temp_dir: text("TEMP_DIR").map(PathBuf::from).unwrap_or(d.temp_dir),
            model_name: text("MODEL_NAME").unwrap_or(d.model_name),
            lora_name: match get("LORA_NAME") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_string()),
                None => d.lora_name,
            },
            inference_url: text("INFERENCE_URL"),
            upload_url: text("UPLOAD_URL"),
            upload_ttl: text("UPLOAD_TTL").unwrap_or(d.upload_ttl),
            frame_count: number("FRAME_COUNT", d.frame_count),
            ai_frame_count: number("AI_FRAME_COUNT", d.ai_frame_count),
            max_frames: number("MAX_FRAMES", d.max_frames),
            fps: number("FPS", d.fps),
            target_size: number("TARGET_SIZE", d.target_size),
            ..d
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> KissResult<()> {
        if self.frame_count < 2 || self.ai_frame_count < 2 {
            return Err(KissError::invalid_input(format!(
                "frame counts must be at least 2 (fallback {}, ai {})",
                self.frame_count, self.ai_frame_count
            )));
        }
        if !(2..=MAX_FRAME_COUNT).contains(&self.max_frames) {
            return Err(KissError::invalid_input(format!(
                "max_frames must be in 2..={MAX_FRAME_COUNT}, got {}",
                self.max_frames
            )));
        }
        if self.frame_count.max(self.ai_frame_count) > self.max_frames {
            return Err(KissError::invalid_input(format!(
                "frame counts exceed max_frames {} (fallback {}, ai {})",
                self.max_frames, self.frame_count, self.ai_frame_count
            )));
        }
        if self.fps == 0 {
            return Err(KissError::invalid_input("fps must be > 0"));
        }
        if self.target_size == 0 || !self.target_size.is_multiple_of(2) {
            return Err(KissError::invalid_input(format!(
                "target size must be even and non-zero for yuv420p, got {}",
                self.target_size
            )));
        }
        if self.fallback_attempts == 0 {
            return Err(KissError::invalid_input("fallback_attempts must be >= 1"));
        }
        Ok(())
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::square(self.target_size)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
