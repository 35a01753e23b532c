use image::RgbImage;
use rayon::prelude::*;

use crate::{
    animation::ease::{Ease, frame_position},
    foundation::error::{KissError, KissResult},
    render::frame::FrameRgb,
    render::pipeline::MAX_FRAME_COUNT,
};

/// Build `frame_count` cross-blended frames from `source` to `target`.
///
/// Frame `i` uses `alpha = ease(i / (frame_count - 1))` and
/// `pixel = (1 - alpha) * source + alpha * target`, rounded and clamped per channel. Frames are
/// computed in parallel but returned in index order; identical inputs give identical bytes.
pub fn interpolate(
    source: &RgbImage,
    target: &RgbImage,
    frame_count: u32,
    ease: Ease,
) -> KissResult<Vec<FrameRgb>> {
    if !(2..=MAX_FRAME_COUNT).contains(&frame_count) {
        return Err(KissError::invalid_input(format!(
            "frame count must be in 2..={MAX_FRAME_COUNT}, got {frame_count}"
        )));
    }
    if source.dimensions() != target.dimensions() {
        let (sw, sh) = source.dimensions();
        let (tw, th) = target.dimensions();
        return Err(KissError::invalid_image(format!(
            "source is {sw}x{sh} but target is {tw}x{th}; preprocess both to one resolution first"
        )));
    }

    let (width, height) = source.dimensions();
    let (src, dst) = (source.as_raw(), target.as_raw());
    let frames = (0..frame_count)
        .into_par_iter()
        .map(|i| {
            let alpha = ease.apply(frame_position(i, frame_count));
            FrameRgb {
                width,
                height,
                data: blend_rgb8(src, dst, alpha),
            }
        })
        .collect();
    Ok(frames)
}

/// `(1 - alpha) * a + alpha * b` over equal-length 8-bit buffers.
pub(crate) fn blend_rgb8(a: &[u8], b: &[u8], alpha: f64) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    let inv = 1.0 - alpha;
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let v = inv * f64::from(x) + alpha * f64::from(y);
            v.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/interpolate.rs"]
mod tests;
