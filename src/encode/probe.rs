use std::path::{Path, PathBuf};
use std::process::Command;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{KissError, KissResult};
use crate::render::frame::FrameRgb;

#[derive(Clone, Debug)]
/// Stream metadata of an encoded video file.
pub struct VideoInfo {
    /// Probed file.
    pub path: PathBuf,
    /// Frame dimensions.
    pub resolution: Resolution,
    /// Average frame rate as reported by the container.
    pub fps: Fps,
    /// Frame count reported by the stream header, when present.
    pub nb_frames: Option<u64>,
    /// Codec name, e.g. `h264`.
    pub codec: String,
}

/// Probe video stream metadata through `ffprobe`.
pub fn probe_video(path: &Path) -> KissResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        codec_name: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| KissError::encoding(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(KissError::encoding(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| KissError::encoding(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| KissError::encoding("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| KissError::encoding("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| KissError::encoding("missing video height from ffprobe"))?;
    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .ok_or_else(|| KissError::encoding("missing video frame rate from ffprobe"))?;

    Ok(VideoInfo {
        path: path.to_path_buf(),
        resolution: Resolution::new(width, height),
        fps,
        nb_frames: stream.nb_frames.as_deref().and_then(|s| s.parse().ok()),
        codec: stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Decode every frame of `info.path` back into RGB8.
pub fn decode_frames(info: &VideoInfo) -> KissResult<Vec<FrameRgb>> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(&info.path)
        .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
        .output()
        .map_err(|e| KissError::encoding(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(KissError::encoding(format!(
            "ffmpeg video decode failed for '{}': {}",
            info.path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = info.resolution.rgb_len();
    if expected_len == 0 {
        return Err(KissError::encoding(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !out.stdout.len().is_multiple_of(expected_len) {
        return Err(KissError::encoding(format!(
            "decoded video has invalid size: got {} bytes, expected multiples of {expected_len}",
            out.stdout.len()
        )));
    }

    Ok(out
        .stdout
        .chunks_exact(expected_len)
        .map(|chunk| FrameRgb {
            width: info.resolution.width,
            height: info.resolution.height,
            data: chunk.to_vec(),
        })
        .collect())
}

/// Parse ffprobe's `num/den` rate strings; `0/0` means unknown.
pub(crate) fn parse_rate(s: &str) -> Option<Fps> {
    let (num, den) = s.trim().split_once('/').unwrap_or((s.trim(), "1"));
    Fps::new(num.parse().ok()?, den.parse().ok()?).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/encode/probe.rs"]
mod tests;
