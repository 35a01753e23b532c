use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::animation::ease::{Ease, frame_position};
use crate::assets::preprocess::preprocess;
use crate::foundation::core::Resolution;
use crate::foundation::error::{KissError, KissResult};
use crate::model::pipeline::{GenerationRequest, InferenceParams, VideoModel};
use crate::render::frame::FrameRgb;
use crate::render::interpolate::blend_rgb8;
use crate::render::pipeline::MAX_FRAME_COUNT;

/// Frames generated per AI request unless overridden.
pub const DEFAULT_AI_FRAME_COUNT: u32 = 24;

/// Trigger words the kissing LoRA was trained on.
pub const LORA_TRIGGER: &str = "k144ing kissing";

const KISS_PROMPTS: [&str; 5] = [
    "two faces approaching for a kiss, romantic lighting, soft focus",
    "faces getting closer, intimate moment, warm atmosphere",
    "lips about to touch, romantic tension, beautiful lighting",
    "passionate kiss between two people, love scene, cinematic",
    "tender kiss, romantic scene, soft lighting, emotional",
];

/// Below this progress the control image is the source face.
const CONTROL_SOURCE_BELOW: f64 = 0.3;
/// Above this progress the control image is the target face.
const CONTROL_TARGET_ABOVE: f64 = 0.7;

const BASE_SEED: u64 = 42;
const INFERENCE_STEPS: u32 = 12;
const GUIDANCE: f32 = 6.5;
const LORA_GUIDANCE: f32 = 6.0;
const LORA_FLOW_SHIFT: f32 = 5.0;
const LORA_STRENGTH: f32 = 1.0;

/// Prompt for a given animation progress in `[0, 1]`.
pub fn prompt_for(progress: f64, with_lora: bool) -> String {
    let idx = ((progress * KISS_PROMPTS.len() as f64) as usize).min(KISS_PROMPTS.len() - 1);
    let stage = KISS_PROMPTS[idx];
    if with_lora {
        format!("{LORA_TRIGGER}, {stage}")
    } else {
        stage.to_string()
    }
}

/// Sampler settings for frame `index`.
pub fn inference_params(index: u32, resolution: Resolution, with_lora: bool) -> InferenceParams {
    InferenceParams {
        num_inference_steps: INFERENCE_STEPS,
        guidance_scale: if with_lora { LORA_GUIDANCE } else { GUIDANCE },
        width: resolution.width,
        height: resolution.height,
        seed: BASE_SEED + u64::from(index),
        lora_strength: with_lora.then_some(LORA_STRENGTH),
        flow_shift: with_lora.then_some(LORA_FLOW_SHIFT),
    }
}

fn control_image(source: &RgbImage, target: &RgbImage, progress: f64) -> RgbImage {
    if progress < CONTROL_SOURCE_BELOW {
        return source.clone();
    }
    if progress > CONTROL_TARGET_ABOVE {
        return target.clone();
    }
    let data = blend_rgb8(source.as_raw(), target.as_raw(), progress);
    RgbImage::from_raw(source.width(), source.height(), data)
        // Both inputs come out of `preprocess` with the same size, so the buffer always fits.
        .unwrap_or_else(|| source.clone())
}

/// Run the inference pipeline once per frame and collect the letterboxed results.
///
/// Frames are generated sequentially; the pipeline owns the accelerator. Any failing frame fails
/// the whole request with [`KissError::GenerationFailure`] so the caller can fall back.
#[instrument(skip_all, fields(model = model.name(), frame_count = frame_count))]
pub fn generate_ai_frames(
    model: &dyn VideoModel,
    source: &RgbImage,
    target: &RgbImage,
    frame_count: u32,
    resolution: Resolution,
) -> KissResult<Vec<FrameRgb>> {
    if !(2..=MAX_FRAME_COUNT).contains(&frame_count) {
        return Err(KissError::invalid_input(format!(
            "frame count must be in 2..={MAX_FRAME_COUNT}, got {frame_count}"
        )));
    }

    let source = preprocess(source, resolution)?;
    let target = preprocess(target, resolution)?;
    let with_lora = model.has_lora();
    info!(with_lora, "generating AI frames");

    let mut frames = Vec::with_capacity(frame_count as usize);
    for i in 0..frame_count {
        let progress = Ease::HalfCosine.apply(frame_position(i, frame_count));
        let req = GenerationRequest {
            prompt: prompt_for(progress, with_lora),
            image: source.clone(),
            control_image: control_image(&source, &target, progress),
            params: inference_params(i, resolution, with_lora),
        };

        let out = model.generate(&req).map_err(|e| frame_failure(i, e))?;
        let out = preprocess(&out, resolution).map_err(|e| frame_failure(i, e))?;
        debug!(frame = i, progress, "frame generated");
        frames.push(FrameRgb::from(out));
    }

    info!(frames = frames.len(), "AI frames generated");
    Ok(frames)
}

fn frame_failure(index: u32, err: KissError) -> KissError {
    match err {
        KissError::GenerationFailure(msg) => {
            KissError::generation(format!("frame {}: {msg}", index + 1))
        }
        other => KissError::generation(format!("frame {}: {other}", index + 1)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/generate.rs"]
mod tests;
