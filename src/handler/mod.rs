//! Job handler: request JSON in, response JSON out.
//!
//! A job walks `Received -> ImagesDecoded -> FramesGenerated -> VideoEncoded -> Packaged` and
//! ends in success or error. AI failures (model unavailable, generation error) divert to the
//! morphing fallback; everything else ends the job with an error response.

pub(crate) mod request;
pub(crate) mod response;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use tracing::{error, info, info_span, warn};

use crate::animation::ease::Ease;
use crate::assets::decode::SizePolicy;
use crate::assets::source::ImageFetcher;
use crate::config::HandlerConfig;
use crate::encode::ffmpeg::{EncoderOpts, encode_mp4, tool_available};
use crate::encode::video::EncodedVideo;
use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{KissError, KissResult};
use crate::model::cache::ModelCache;
use crate::model::generate::generate_ai_frames;
use crate::model::pipeline::ModelLoader;
use crate::model::remote::RemotePipelineLoader;
use crate::model::validate::validate_model_dir;
use crate::package::packager::Packager;
use crate::package::upload::HttpUploader;
use crate::render::pipeline::{AnimationRequest, morph_frames};

use request::{JobInput, JobRequest};
use response::{
    EnvironmentInfo, HealthReport, HealthStatus, JobReply, JobResponse, JobStatus, MORPHING_MODEL,
};

/// Where a job currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Received,
    ImagesDecoded,
    FramesGenerated,
    VideoEncoded,
    Packaged,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::ImagesDecoded => "images_decoded",
            Self::FramesGenerated => "frames_generated",
            Self::VideoEncoded => "video_encoded",
            Self::Packaged => "packaged",
        };
        f.write_str(s)
    }
}

fn enter(stage: Stage) {
    info!(%stage, "job stage");
}

/// Per-job parameters after validation.
#[derive(Clone, Copy, Debug)]
struct JobPlan {
    fallback_frames: u32,
    ai_frames: u32,
    fps: Fps,
    resolution: Resolution,
}

/// A produced video plus how it was made.
struct Rendered {
    video: EncodedVideo,
    status: JobStatus,
    model_used: String,
    ai_error: Option<String>,
}

/// Processes jobs. Holds the model cache and the HTTP clients, so build one and reuse it.
pub struct Handler {
    config: HandlerConfig,
    cache: Arc<ModelCache>,
    loader: Box<dyn ModelLoader>,
    fetcher: ImageFetcher,
    packager: Packager,
    encoder: EncoderOpts,
}

impl Handler {
    /// Handler wired to the inference service and upload host named in `config`.
    pub fn new(config: HandlerConfig) -> KissResult<Self> {
        let loader = RemotePipelineLoader {
            cache_dir: config.cache_dir.clone(),
            model_name: config.model_name.clone(),
            lora_name: config.lora_name.clone(),
            endpoint: config.inference_url.clone(),
            timeout: config.inference_timeout,
        };
        let packager = match &config.upload_url {
            Some(url) => Packager::with_uploader(
                Box::new(HttpUploader::new(url.clone(), config.upload_timeout)?),
                config.upload_ttl.clone(),
            ),
            None => Packager::inline_only(),
        };
        Self::with_parts(config, Arc::new(ModelCache::new()), Box::new(loader), packager)
    }

    /// Handler with caller-provided model cache, loader and packager.
    pub fn with_parts(
        config: HandlerConfig,
        cache: Arc<ModelCache>,
        loader: Box<dyn ModelLoader>,
        packager: Packager,
    ) -> KissResult<Self> {
        config.validate()?;
        let fetcher = ImageFetcher::new(config.fetch_timeout, SizePolicy::default())?;
        let encoder = EncoderOpts {
            temp_dir: config.temp_dir.clone(),
            program: config.ffmpeg.clone(),
        };
        Ok(Self {
            config,
            cache,
            loader,
            fetcher,
            packager,
            encoder,
        })
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Job boundary: always returns a JSON object, also for malformed payloads and panics.
    pub fn handle_value(&self, payload: serde_json::Value) -> serde_json::Value {
        let started = Instant::now();
        let reply = catch_unwind(AssertUnwindSafe(|| {
            match serde_json::from_value::<JobRequest>(payload) {
                Ok(job) => self.handle(&job),
                Err(e) => {
                    warn!(error = %e, "malformed job payload");
                    JobReply::Job(
                        JobResponse::error(format!("invalid job payload: {e}"))
                            .with_elapsed(started.elapsed()),
                    )
                }
            }
        }));

        match reply {
            Ok(reply) => reply.to_value(),
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(panic = %msg, "job panicked");
                JobReply::Job(
                    JobResponse::error(format!("internal error: {msg}"))
                        .with_elapsed(started.elapsed()),
                )
                .to_value()
            }
        }
    }

    /// Run one job.
    pub fn handle(&self, job: &JobRequest) -> JobReply {
        let span = info_span!("job", id = job.id.as_deref().unwrap_or("-"));
        let _guard = span.enter();

        if job.input.health_check {
            info!("health check requested");
            return JobReply::Health(self.health());
        }

        let started = Instant::now();
        enter(Stage::Received);
        let response = match self.run(&job.input) {
            Ok(response) => response,
            Err(failure) => {
                error!(error = %failure.error, "job failed");
                JobResponse {
                    fallback_error: failure.fallback_error,
                    ..JobResponse::error(failure.error)
                }
            }
        };
        JobReply::Job(
            response
                .with_id(job.id.clone())
                .with_elapsed(started.elapsed()),
        )
    }

    fn run(&self, input: &JobInput) -> Result<JobResponse, JobFailure> {
        let plan = self.plan(input)?;
        let (source_ref, target_ref) = input.image_refs()?;
        let source = self.fetcher.load(source_ref.raw, source_ref.allow_raw_base64)?;
        let target = self.fetcher.load(target_ref.raw, target_ref.allow_raw_base64)?;
        enter(Stage::ImagesDecoded);

        let rendered = self.render(&source, &target, &plan, input.use_ai)?;

        let packaged = self.packager.package(&rendered.video, input.output_format);
        enter(Stage::Packaged);

        let mut response = JobResponse::video(
            rendered.status,
            packaged,
            rendered.video.frame_count(),
            rendered.video.resolution(),
            rendered.model_used,
        );
        response.error = rendered.ai_error;
        info!(status = ?response.status, "job finished");
        Ok(response)
    }

    fn plan(&self, input: &JobInput) -> KissResult<JobPlan> {
        let fps = Fps::whole(input.fps_or(self.config.fps)?)?;
        let max = self.config.max_frames;
        Ok(JobPlan {
            fallback_frames: input.frame_count_or(self.config.frame_count, max)?,
            ai_frames: input.frame_count_or(self.config.ai_frame_count, max)?,
            fps,
            resolution: self.config.resolution(),
        })
    }

    fn render(
        &self,
        source: &RgbImage,
        target: &RgbImage,
        plan: &JobPlan,
        use_ai: bool,
    ) -> Result<Rendered, JobFailure> {
        if !use_ai {
            let video = self.fallback(source, target, plan)?;
            return Ok(Rendered {
                video,
                status: JobStatus::Success,
                model_used: MORPHING_MODEL.to_string(),
                ai_error: None,
            });
        }

        let ai_err = match self.ai_video(source, target, plan) {
            Ok((video, model_used)) => {
                return Ok(Rendered {
                    video,
                    status: JobStatus::Success,
                    model_used,
                    ai_error: None,
                });
            }
            Err(e) if e.is_fallback_trigger() => e,
            Err(e) => return Err(e.into()),
        };

        warn!(error = %ai_err, "AI generation failed, using morphing fallback");
        match self.fallback(source, target, plan) {
            Ok(video) => Ok(Rendered {
                video,
                status: JobStatus::FallbackSuccess,
                model_used: MORPHING_MODEL.to_string(),
                ai_error: Some(ai_err.to_string()),
            }),
            Err(fallback_err) => Err(JobFailure {
                error: ai_err.to_string(),
                fallback_error: Some(fallback_err.to_string()),
            }),
        }
    }

    fn ai_video(
        &self,
        source: &RgbImage,
        target: &RgbImage,
        plan: &JobPlan,
    ) -> KissResult<(EncodedVideo, String)> {
        let model = self.cache.get_or_load(self.loader.as_ref())?;
        let frames =
            generate_ai_frames(model.as_ref(), source, target, plan.ai_frames, plan.resolution)?;
        enter(Stage::FramesGenerated);
        let video = encode_mp4(&frames, plan.fps, &self.encoder)?;
        enter(Stage::VideoEncoded);
        Ok((video, model.name().to_string()))
    }

    /// The deterministic morphing path, retried up to `fallback_attempts` times.
    fn fallback(
        &self,
        source: &RgbImage,
        target: &RgbImage,
        plan: &JobPlan,
    ) -> KissResult<EncodedVideo> {
        let req = AnimationRequest::new(
            source.clone(),
            target.clone(),
            plan.fallback_frames,
            plan.fps,
        )?;

        let attempts = self.config.fallback_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.morph_once(&req, plan.resolution) {
                Ok(video) => return Ok(video),
                Err(e) if attempt < attempts && !e.is_terminal_input() => {
                    warn!(attempt, error = %e, "morphing fallback failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn morph_once(
        &self,
        req: &AnimationRequest,
        resolution: Resolution,
    ) -> KissResult<EncodedVideo> {
        let frames = morph_frames(req, resolution, Ease::HalfCosine)?;
        enter(Stage::FramesGenerated);
        let video = encode_mp4(&frames, req.fps(), &self.encoder)?;
        enter(Stage::VideoEncoded);
        Ok(video)
    }

    /// Model and environment diagnostics.
    pub fn health(&self) -> HealthReport {
        let model_validation = validate_model_dir(
            &self.config.cache_dir,
            &self.config.model_name,
            self.config.lora_name.as_deref(),
        );
        let program = self.config.ffmpeg.to_string_lossy();
        let environment = EnvironmentInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            ffmpeg_available: tool_available(&program),
            ffprobe_available: tool_available("ffprobe"),
            temp_dir: self.config.temp_dir.display().to_string(),
            temp_dir_writable: tempfile::tempfile_in(&self.config.temp_dir).is_ok(),
            inference_configured: self.config.inference_url.is_some(),
            upload_configured: self.packager.can_upload(),
            worker_threads: rayon::current_num_threads(),
        };
        // The morphing path only needs ffmpeg and a scratch directory.
        let status = if environment.ffmpeg_available && environment.temp_dir_writable {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        HealthReport {
            status,
            model_validation,
            environment,
            models_loaded: self.cache.is_loaded(),
        }
    }
}

/// Terminal job failure, possibly after the fallback also failed.
#[derive(Debug)]
struct JobFailure {
    error: String,
    fallback_error: Option<String>,
}

impl From<KissError> for JobFailure {
    fn from(e: KissError) -> Self {
        Self {
            error: e.to_string(),
            fallback_error: None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/handler/mod.rs"]
mod tests;
