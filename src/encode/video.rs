use crate::foundation::core::{Fps, Resolution};

/// An encoded MP4 plus the parameters it was produced with. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVideo {
    bytes: Vec<u8>,
    frame_count: u32,
    fps: Fps,
    resolution: Resolution,
}

impl EncodedVideo {
    pub fn new(bytes: Vec<u8>, frame_count: u32, fps: Fps, resolution: Resolution) -> Self {
        Self {
            bytes,
            frame_count,
            fps,
            resolution,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(u64::from(self.frame_count))
    }

    /// Stable 64-bit content fingerprint (xxh3).
    pub fn fingerprint(&self) -> u64 {
        xxhash_rust::xxh3::xxh3_64(&self.bytes)
    }
}
