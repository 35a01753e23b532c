//! HTTP client for an external inference service hosting the image-to-video pipeline.
//!
//! The service receives one JSON request per frame and answers with a base64 image:
//!
//! ```text
//! POST {endpoint}
//! { "model": "...", "lora": "...", "prompt": "...", "image": "<b64 png>",
//!   "control_image": "<b64 png>", "num_inference_steps": 12, "guidance_scale": 6.5,
//!   "width": 512, "height": 512, "seed": 42 }
//! -> { "image": "<b64 png>" }
//! ```

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbImage;
use tracing::{debug, warn};

use crate::assets::decode::decode_image;
use crate::foundation::error::{KissError, KissResult};
use crate::model::pipeline::{GenerationRequest, ModelLoader, VideoModel};
use crate::model::validate::validate_model_dir;

/// Pipeline handle backed by the inference service.
pub struct RemotePipeline {
    http: reqwest::blocking::Client,
    endpoint: String,
    model_name: String,
    lora_name: Option<String>,
    display_name: String,
}

impl RemotePipeline {
    pub fn new(
        endpoint: impl Into<String>,
        model_name: impl Into<String>,
        lora_name: Option<String>,
        timeout: Duration,
    ) -> KissResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KissError::model_unavailable(format!("build inference client: {e}")))?;
        let model_name = model_name.into();
        let display_name = match &lora_name {
            Some(lora) => format!("{model_name} + {lora}"),
            None => model_name.clone(),
        };
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model_name,
            lora_name,
            display_name,
        })
    }
}

#[derive(serde::Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lora: Option<&'a str>,
    prompt: &'a str,
    image: String,
    control_image: String,
    #[serde(flatten)]
    params: crate::model::pipeline::InferenceParams,
}

#[derive(serde::Deserialize)]
struct WireResponse {
    image: Option<String>,
    error: Option<String>,
}

impl VideoModel for RemotePipeline {
    fn name(&self) -> &str {
        &self.display_name
    }

    fn has_lora(&self) -> bool {
        self.lora_name.is_some()
    }

    fn generate(&self, req: &GenerationRequest) -> KissResult<RgbImage> {
        let body = WireRequest {
            model: &self.model_name,
            lora: self.lora_name.as_deref(),
            prompt: &req.prompt,
            image: png_base64(&req.image)?,
            control_image: png_base64(&req.control_image)?,
            params: req.params,
        };

        debug!(seed = req.params.seed, endpoint = %self.endpoint, "inference request");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| KissError::generation(format!("inference request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(KissError::generation(format!(
                "inference service returned {status}: {}",
                crate::assets::source::preview(&text, 200)
            )));
        }

        let parsed: WireResponse = response
            .json()
            .map_err(|e| KissError::generation(format!("invalid inference response: {e}")))?;
        if let Some(err) = parsed.error {
            return Err(KissError::generation(format!("inference service error: {err}")));
        }
        let encoded = parsed
            .image
            .ok_or_else(|| KissError::generation("inference response has no image"))?;
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| KissError::generation(format!("inference image is not base64: {e}")))?;
        decode_image(&bytes)
            .map_err(|e| KissError::generation(format!("inference image does not decode: {e}")))
    }
}

fn png_base64(img: &RgbImage) -> KissResult<String> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| KissError::generation(format!("encode conditioning image: {e}")))?;
    Ok(STANDARD.encode(out.into_inner()))
}

/// Loads a [`RemotePipeline`] after checking the mounted model cache.
#[derive(Clone, Debug)]
pub struct RemotePipelineLoader {
    pub cache_dir: PathBuf,
    pub model_name: String,
    pub lora_name: Option<String>,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl ModelLoader for RemotePipelineLoader {
    fn load(&self) -> KissResult<Arc<dyn VideoModel>> {
        let report =
            validate_model_dir(&self.cache_dir, &self.model_name, self.lora_name.as_deref());
        if !report.models_found {
            return Err(KissError::model_unavailable(report.errors.join("; ")));
        }
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            KissError::model_unavailable("no inference endpoint configured (INFERENCE_URL)")
        })?;

        let lora = if report.lora_found {
            self.lora_name.clone()
        } else {
            if let Some(name) = &self.lora_name {
                warn!(lora = %name, "LoRA adapter not found, continuing with the base model");
            }
            None
        };

        let pipeline = RemotePipeline::new(endpoint, self.model_name.clone(), lora, self.timeout)?;
        Ok(Arc::new(pipeline))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/remote.rs"]
mod tests;
