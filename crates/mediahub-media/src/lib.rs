//! # mediahub-media
//!
//! Thin async wrappers around the external `ffmpeg` and `ffprobe` tools.
//! Service code depends on the [`MediaToolkit`] trait so tests can swap in
//! a fake implementation.

pub mod error;
pub mod ffmpeg;
pub mod parse;
pub mod toolkit;

pub use error::MediaToolError;
pub use ffmpeg::FfmpegToolkit;
pub use parse::thumbnail_timestamp;
pub use toolkit::{HlsOutput, MediaToolkit};
