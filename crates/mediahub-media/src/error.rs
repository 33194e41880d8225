//! Error type for external media tool invocations.

use std::path::PathBuf;

use mediahub_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Failure of an `ffmpeg`/`ffprobe` invocation.
#[derive(Debug, Error)]
pub enum MediaToolError {
    /// The executable could not be started.
    #[error("Media tool not found: {program}")]
    CommandNotFound {
        /// Configured program path.
        program: String,
    },

    /// The tool ran and exited unsuccessfully.
    #[error("{program} exited with code {code:?}: {stderr}")]
    ProcessFailed {
        /// Program that failed.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Last lines of captured stderr.
        stderr: String,
    },

    /// The tool's output could not be interpreted.
    #[error("Unexpected {what} output: {output:?}")]
    Parse {
        /// Which value was being read.
        what: &'static str,
        /// Raw stdout.
        output: String,
    },

    /// The tool reported success but the expected file is missing.
    #[error("Output not created: {path}")]
    OutputMissing {
        /// Expected output path.
        path: PathBuf,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaToolError> for AppError {
    fn from(err: MediaToolError) -> Self {
        match &err {
            MediaToolError::Io(_) => AppError::new(ErrorKind::Storage, err.to_string()),
            _ => AppError::with_source(ErrorKind::ExternalService, err.to_string(), err),
        }
    }
}
