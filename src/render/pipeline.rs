use image::RgbImage;
use tracing::{debug, instrument};

use crate::{
    animation::ease::Ease,
    assets::preprocess::preprocess,
    encode::ffmpeg::{EncoderOpts, encode_mp4},
    encode::video::EncodedVideo,
    foundation::core::{Fps, Resolution},
    foundation::error::{KissError, KissResult},
    render::frame::FrameRgb,
    render::interpolate::interpolate,
};

/// Frames in a morphing video when the request does not say otherwise (2 s at 24 fps).
pub const DEFAULT_FRAME_COUNT: u32 = 48;
/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 24;
/// Upper bound on frames per video; every frame is held in memory before encoding.
pub const MAX_FRAME_COUNT: u32 = 240;

/// Two decoded images plus the sequence parameters for one animation.
#[derive(Clone, Debug)]
pub struct AnimationRequest {
    source: RgbImage,
    target: RgbImage,
    frame_count: u32,
    fps: Fps,
}

impl AnimationRequest {
    /// Validate `2 <= frame_count <= MAX_FRAME_COUNT`; `fps` is validated by construction.
    pub fn new(source: RgbImage, target: RgbImage, frame_count: u32, fps: Fps) -> KissResult<Self> {
        if !(2..=MAX_FRAME_COUNT).contains(&frame_count) {
            return Err(KissError::invalid_input(format!(
                "frame count must be in 2..={MAX_FRAME_COUNT}, got {frame_count}"
            )));
        }
        Ok(Self {
            source,
            target,
            frame_count,
            fps,
        })
    }

    /// Request with the default 48 frames at 24 fps.
    pub fn with_defaults(source: RgbImage, target: RgbImage) -> Self {
        Self {
            source,
            target,
            frame_count: DEFAULT_FRAME_COUNT,
            fps: Fps::default(),
        }
    }

    pub fn source(&self) -> &RgbImage {
        &self.source
    }

    pub fn target(&self) -> &RgbImage {
        &self.target
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }
}

/// Letterbox both images to `resolution` and build the eased blend sequence.
#[instrument(level = "debug", skip(req), fields(frames = req.frame_count))]
pub fn morph_frames(
    req: &AnimationRequest,
    resolution: Resolution,
    ease: Ease,
) -> KissResult<Vec<FrameRgb>> {
    let source = preprocess(&req.source, resolution)?;
    let target = preprocess(&req.target, resolution)?;
    debug!(%resolution, "inputs preprocessed");
    interpolate(&source, &target, req.frame_count, ease)
}

/// The deterministic morphing video: preprocess, interpolate, encode.
pub fn render_morph(
    req: &AnimationRequest,
    resolution: Resolution,
    ease: Ease,
    opts: &EncoderOpts,
) -> KissResult<EncodedVideo> {
    let frames = morph_frames(req, resolution, ease)?;
    encode_mp4(&frames, req.fps, opts)
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
