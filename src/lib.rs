//! kissframe turns two face images into a short "kiss" animation video.
//!
//! A job first tries an image-to-video inference pipeline (optionally with a LoRA adapter). When
//! the pipeline is unavailable or fails, a deterministic morphing fallback takes over:
//!
//! - Letterbox both faces onto a fixed canvas ([`preprocess`])
//! - Cross-blend them with a half-cosine ease ([`interpolate`])
//! - Encode the frames as H.264 MP4 through `ffmpeg` ([`encode_mp4`])
//! - Return the video inline as base64 or as an uploaded URL ([`Packager`])
//!
//! [`Handler`] ties the steps together behind a JSON-in/JSON-out job boundary.
#![forbid(unsafe_code)]

mod assets;
mod config;
mod foundation;
mod handler;
mod model;
mod package;

pub(crate) mod animation;
/// Encoding sinks and `ffmpeg`/`ffprobe` helpers.
pub mod encode;
pub(crate) mod render;

pub use crate::foundation::core::{Fps, FrameIndex, Resolution};
pub use crate::foundation::error::{KissError, KissResult};

pub use crate::animation::ease::{Ease, frame_position};
pub use crate::assets::decode::{SizePolicy, decode_image};
pub use crate::assets::preprocess::preprocess;
pub use crate::assets::source::{ImageFetcher, ImageSource, decode_base64};
pub use crate::config::HandlerConfig;
pub use crate::encode::ffmpeg::{EncoderOpts, FfmpegSink, FfmpegSinkOpts, encode_mp4};
pub use crate::encode::probe::{VideoInfo, decode_frames, probe_video};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::video::EncodedVideo;
pub use crate::handler::request::{ImageRef, JobInput, JobRequest};
pub use crate::handler::response::{
    EnvironmentInfo, HealthReport, HealthStatus, JobReply, JobResponse, JobStatus, MORPHING_MODEL,
};
pub use crate::handler::{Handler, Stage};
pub use crate::model::cache::ModelCache;
pub use crate::model::generate::{DEFAULT_AI_FRAME_COUNT, generate_ai_frames};
pub use crate::model::pipeline::{GenerationRequest, InferenceParams, ModelLoader, VideoModel};
pub use crate::model::remote::{RemotePipeline, RemotePipelineLoader};
pub use crate::model::validate::{ModelValidation, validate_model_dir};
pub use crate::package::packager::{
    OutputFormat, PackagedVideo, Packager, UPLOAD_FALLBACK_NOTE, VideoPayload, encode_base64,
    video_filename,
};
pub use crate::package::upload::{HttpUploader, Uploader};
pub use crate::render::frame::FrameRgb;
pub use crate::render::interpolate::interpolate;
pub use crate::render::pipeline::{
    AnimationRequest, DEFAULT_FPS, DEFAULT_FRAME_COUNT, morph_frames, render_morph,
};
