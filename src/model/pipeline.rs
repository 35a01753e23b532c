use std::sync::Arc;

use image::RgbImage;

use crate::foundation::error::KissResult;

/// Sampler settings forwarded verbatim to the inference pipeline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct InferenceParams {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    /// Adapter weight; only sent when a LoRA is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_strength: Option<f32>,
    /// Flow-matching shift; only sent when a LoRA is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_shift: Option<f32>,
}

/// One call into the image-to-video pipeline.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Conditioning image (the preprocessed source face).
    pub image: RgbImage,
    /// Per-frame control image steering the animation towards the target face.
    pub control_image: RgbImage,
    pub params: InferenceParams,
}

/// A loaded, callable inference pipeline. Its internals are opaque to this crate.
pub trait VideoModel: Send + Sync {
    /// Identifier reported as `model_used`.
    fn name(&self) -> &str;
    /// Whether a LoRA adapter is active (switches prompt trigger words and sampler settings).
    fn has_lora(&self) -> bool;
    /// Produce one frame.
    fn generate(&self, req: &GenerationRequest) -> KissResult<RgbImage>;
}

/// Builds a [`VideoModel`]; called by [`crate::ModelCache`] on a cache miss.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> KissResult<Arc<dyn VideoModel>>;
}
