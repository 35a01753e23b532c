use image::RgbImage;

use crate::foundation::core::Resolution;
use crate::foundation::error::{KissError, KissResult};

/// One video frame as RGB8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGB8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRgb {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// RGB pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let off = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[off], self.data[off + 1], self.data[off + 2]]
    }

    /// Write this frame into `dst` with the red and blue channels swapped.
    pub fn write_bgr(&self, dst: &mut [u8]) -> KissResult<()> {
        if dst.len() != self.data.len() {
            return Err(KissError::encoding(format!(
                "bgr scratch buffer is {} bytes, frame needs {}",
                dst.len(),
                self.data.len()
            )));
        }
        for (d, s) in dst.chunks_exact_mut(3).zip(self.data.chunks_exact(3)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
        }
        Ok(())
    }

    pub fn into_image(self) -> KissResult<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| KissError::invalid_image("frame buffer does not match its dimensions"))
    }
}

impl From<RgbImage> for FrameRgb {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// Shared resolution of `frames`, or an error when the sequence is empty or mixed.
pub fn common_resolution(frames: &[FrameRgb]) -> KissResult<Resolution> {
    let first = frames.first().ok_or(KissError::EmptyFrameSequence)?;
    let res = first.resolution();
    for (i, f) in frames.iter().enumerate() {
        if f.resolution() != res {
            return Err(KissError::invalid_image(format!(
                "frame {i} is {}, expected {res}",
                f.resolution()
            )));
        }
        if f.data.len() != res.rgb_len() {
            return Err(KissError::invalid_image(format!(
                "frame {i} buffer is {} bytes, expected {}",
                f.data.len(),
                res.rgb_len()
            )));
        }
    }
    Ok(res)
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
