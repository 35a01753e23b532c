use image::{RgbImage, imageops::FilterType};

use crate::foundation::error::{KissError, KissResult};

/// Decode encoded image bytes (PNG, JPEG, WebP, ...) into RGB8.
pub fn decode_image(bytes: &[u8]) -> KissResult<RgbImage> {
    if bytes.is_empty() {
        return Err(KissError::invalid_image("image payload is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| KissError::invalid_image(format!("decode image from memory: {e}")))?;
    let rgb = dyn_img.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(KissError::invalid_image("image has zero width or height"));
    }
    Ok(rgb)
}

/// Accepted input image dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizePolicy {
    /// Inputs with either side below this are rejected.
    pub min_side: u32,
    /// Inputs with either side above this are downscaled before use.
    pub max_side: u32,
    /// Bounding box side used when downscaling oversize inputs.
    pub downscale_to: u32,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            min_side: 64,
            max_side: 4096,
            downscale_to: 2048,
        }
    }
}

impl SizePolicy {
    /// Reject undersized inputs and shrink oversize ones, keeping aspect ratio.
    pub fn apply(&self, img: RgbImage) -> KissResult<RgbImage> {
        let (w, h) = img.dimensions();
        if w < self.min_side || h < self.min_side {
            return Err(KissError::invalid_input(format!(
                "image too small: {w}x{h} (minimum side is {})",
                self.min_side
            )));
        }
        if w <= self.max_side && h <= self.max_side {
            return Ok(img);
        }

        let (nw, nh) = fit_within(w, h, self.downscale_to, self.downscale_to);
        tracing::info!(
            from = %format!("{w}x{h}"),
            to = %format!("{nw}x{nh}"),
            "downscaling large input image"
        );
        Ok(image::imageops::resize(&img, nw, nh, FilterType::Lanczos3))
    }
}

/// Largest `(w', h')` with the aspect ratio of `(w, h)` that fits in `(max_w, max_h)`.
///
/// Uses integer floor arithmetic; sides never drop below 1.
pub(crate) fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let (w64, h64) = (u64::from(w), u64::from(h));
    let (mw, mh) = (u64::from(max_w), u64::from(max_h));
    if w64 * mh >= h64 * mw {
        // Width is the limiting side.
        let nh = (h64 * mw / w64).max(1);
        (max_w, nh as u32)
    } else {
        let nw = (w64 * mh / h64).max(1);
        (nw as u32, max_h)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
