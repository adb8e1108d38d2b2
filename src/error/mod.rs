use std::path::PathBuf;
use std::result;
use thiserror::Error;

/// Process-level failures. Everything album- or track-scoped is recovered locally.
#[derive(Error, Debug)]
pub enum CueSplitError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Required external tool is not available: {0}")]
    MissingTool(PathBuf),

    #[error("Root path is not a directory: {0}")]
    RootNotADirectory(PathBuf),
}

pub type CueSplitResult<T> = result::Result<T, CueSplitError>;
