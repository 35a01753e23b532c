use std::time::Duration;

use serde::Serialize;

use crate::foundation::core::Resolution;
use crate::model::validate::ModelValidation;
use crate::package::packager::{PackagedVideo, VideoPayload};

/// `model_used` for videos produced by the deterministic blend.
pub const MORPHING_MODEL: &str = "morphing_fallback";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The requested path produced the video.
    Success,
    /// The AI path failed and the morphing fallback produced the video.
    FallbackSuccess,
    Error,
}

/// The JSON object returned for a generation job.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobResponse {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// For `fallback_success`: the AI failure. For `error`: the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_error: Option<String>,
}

impl JobResponse {
    fn empty(status: JobStatus) -> Self {
        Self {
            status,
            id: None,
            video: None,
            video_url: None,
            filename: None,
            file_size: None,
            expires_in: None,
            processing_time: None,
            num_frames: None,
            resolution: None,
            model_used: None,
            note: None,
            error: None,
            fallback_error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty(JobStatus::Error)
        }
    }

    /// A finished video. `status` is `Success` or `FallbackSuccess`.
    pub fn video(
        status: JobStatus,
        packaged: PackagedVideo,
        num_frames: u32,
        resolution: Resolution,
        model_used: impl Into<String>,
    ) -> Self {
        let mut out = Self {
            num_frames: Some(num_frames),
            resolution: Some(resolution.to_string()),
            model_used: Some(model_used.into()),
            note: packaged.note,
            ..Self::empty(status)
        };
        match packaged.payload {
            VideoPayload::Inline { base64 } => out.video = Some(base64),
            VideoPayload::Hosted {
                url,
                filename,
                file_size,
                expires_in,
            } => {
                out.video_url = Some(url);
                out.filename = Some(filename);
                out.file_size = Some(file_size);
                out.expires_in = Some(expires_in);
            }
        }
        out
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.processing_time = Some(format_elapsed(elapsed));
        self
    }
}

/// `"<seconds with one decimal>s"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Process-level facts reported by the health check.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnvironmentInfo {
    pub version: String,
    pub ffmpeg_available: bool,
    pub ffprobe_available: bool,
    pub temp_dir: String,
    pub temp_dir_writable: bool,
    pub inference_configured: bool,
    pub upload_configured: bool,
    pub worker_threads: usize,
}

/// Answer to `{"input": {"health_check": true}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model_validation: ModelValidation,
    pub environment: EnvironmentInfo,
    pub models_loaded: bool,
}

/// Anything the handler returns to the queue.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobReply {
    Job(JobResponse),
    Health(HealthReport),
}

impl JobReply {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": "error",
                "error": format!("failed to serialize response: {e}"),
            })
        })
    }
}
