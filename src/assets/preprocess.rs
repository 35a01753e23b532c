use image::{Rgb, RgbImage, imageops::FilterType};

use crate::{
    assets::decode::fit_within,
    foundation::core::Resolution,
    foundation::error::{KissError, KissResult},
};

/// Letterbox `image` onto a black canvas of exactly `target` pixels.
///
/// The image is scaled (Lanczos3) so that its limiting side spans the canvas, then centered with
/// `pad = (target - scaled) / 2` on each axis. Nothing is cropped and the aspect ratio is kept.
pub fn preprocess(image: &RgbImage, target: Resolution) -> KissResult<RgbImage> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(KissError::invalid_image("image has zero width or height"));
    }
    if target.is_empty() {
        return Err(KissError::invalid_image(format!(
            "preprocess target must be non-empty, got {target}"
        )));
    }

    if (w, h) == (target.width, target.height) {
        return Ok(image.clone());
    }

    let (sw, sh) = fit_within(w, h, target.width, target.height);
    let scaled = if (w, h) == (sw, sh) {
        image.clone()
    } else {
        image::imageops::resize(image, sw, sh, FilterType::Lanczos3)
    };

    let mut canvas = RgbImage::from_pixel(target.width, target.height, Rgb([0, 0, 0]));
    let pad_x = (target.width - sw) / 2;
    let pad_y = (target.height - sh) / 2;
    image::imageops::replace(&mut canvas, &scaled, i64::from(pad_x), i64::from(pad_y));
    Ok(canvas)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/preprocess.rs"]
mod tests;
