//! Video encoding.
//!
//! Frames are pushed in order into a [`sink::FrameSink`]; [`ffmpeg::encode_mp4`] wraps the
//! `ffmpeg` sink into a one-shot "frames in, MP4 bytes out" call.

/// `ffmpeg`-based sinks (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// `ffprobe` metadata and decode-back helpers.
pub mod probe;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
/// Immutable encoded video value.
pub mod video;
