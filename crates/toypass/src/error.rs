use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the pass core.
///
/// Every variant is recovered locally: callers log it and fold it into
/// unit state. None of them should ever take down the render loop.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("no file exists at {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("shader compilation failed: {0}")]
    CompileFailure(String),
    #[error("failed to decode image at {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },
    #[error("cubemap face set rejected: {0}")]
    FormatMismatch(String),
    #[error("channel index {0} exceeds the supported channel count")]
    InvalidChannel(usize),
    #[error("program does not declare uniform '{0}'")]
    ChannelNotBound(String),
}
