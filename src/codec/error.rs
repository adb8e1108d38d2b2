use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("No usable duration reported for {0}")]
    MissingDuration(PathBuf),
}

pub type CodecResult<T> = Result<T, CodecError>;
