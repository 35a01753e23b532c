use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info};

use crate::encode::sink::{FrameSink, SinkConfig, write_all};
use crate::encode::video::EncodedVideo;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KissError, KissResult};
use crate::render::frame::FrameRgb;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// `ffmpeg` executable, looked up on `PATH` when not absolute.
    pub program: PathBuf,
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            program: PathBuf::from("ffmpeg"),
        }
    }
}

/// Sink that spawns `ffmpeg` and streams raw BGR frames to its stdin.
///
/// Output is H.264 / yuv420p MP4 with `+faststart`, which needs even frame dimensions.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> KissResult<()> {
        let res = cfg.resolution;
        if res.is_empty() {
            return Err(KissError::encoding("ffmpeg sink width/height must be non-zero"));
        }
        if !res.width.is_multiple_of(2) || !res.height.is_multiple_of(2) {
            return Err(KissError::encoding(format!(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output), got {res}"
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(KissError::encoding(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let mut cmd = Command::new(&self.opts.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        // Input: raw BGR24 frames; push_frame swaps channels from RGB.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "bgr24",
            "-s",
            &res.to_string(),
            "-r",
            &cfg.fps.to_ffmpeg_rate(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            KissError::encoding(format!(
                "failed to spawn '{}' (is ffmpeg installed and on PATH?): {e}",
                self.opts.program.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KissError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| KissError::encoding("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        debug!(resolution = %res, fps = %cfg.fps.to_ffmpeg_rate(), "ffmpeg started");
        self.scratch = vec![0u8; res.rgb_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgb) -> KissResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KissError::encoding("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(KissError::encoding(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.resolution() != cfg.resolution {
            return Err(KissError::invalid_image(format!(
                "frame size mismatch: got {}, expected {}",
                frame.resolution(),
                cfg.resolution
            )));
        }

        frame.write_bgr(&mut self.scratch)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KissError::encoding("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            KissError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> KissResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KissError::encoding("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            KissError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KissError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| KissError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(KissError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Abandoned mid-stream: do not leave the encoder process behind.
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Where [`encode_mp4`] writes its scratch file and which `ffmpeg` it runs.
#[derive(Clone, Debug)]
pub struct EncoderOpts {
    /// Directory for the temporary MP4; removed again before `encode_mp4` returns.
    pub temp_dir: PathBuf,
    /// `ffmpeg` executable.
    pub program: PathBuf,
}

impl Default for EncoderOpts {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            program: PathBuf::from("ffmpeg"),
        }
    }
}

/// Encode `frames` into an in-memory MP4.
///
/// The video is written to a temporary file, read back, and the file is deleted when this returns
/// (also on error).
pub fn encode_mp4(frames: &[FrameRgb], fps: Fps, opts: &EncoderOpts) -> KissResult<EncodedVideo> {
    if frames.is_empty() {
        return Err(KissError::EmptyFrameSequence);
    }
    let resolution = crate::render::frame::common_resolution(frames)?;

    std::fs::create_dir_all(&opts.temp_dir).map_err(|e| {
        KissError::encoding(format!(
            "failed to create temp dir '{}': {e}",
            opts.temp_dir.display()
        ))
    })?;
    let tmp = tempfile::Builder::new()
        .prefix("kissframe-")
        .suffix(".mp4")
        .tempfile_in(&opts.temp_dir)
        .map_err(|e| KissError::encoding(format!("failed to create temp video file: {e}")))?;

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: tmp.path().to_path_buf(),
        overwrite: true,
        program: opts.program.clone(),
    });
    write_all(&mut sink, frames, fps)?;

    let bytes = std::fs::read(tmp.path())
        .map_err(|e| KissError::encoding(format!("failed to read encoded video back: {e}")))?;
    if bytes.is_empty() {
        return Err(KissError::encoding("ffmpeg produced an empty file"));
    }
    drop(tmp);

    info!(
        frames = frames.len(),
        resolution = %resolution,
        bytes = bytes.len(),
        "video encoded"
    );
    Ok(EncodedVideo::new(bytes, frames.len() as u32, fps, resolution))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> KissResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            KissError::encoding(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `program -version` runs successfully.
pub fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
