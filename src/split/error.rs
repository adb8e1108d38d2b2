use crate::codec::error::CodecError;
use crate::cue::error::CueError;
use std::path::PathBuf;
use thiserror::Error;

/// Album-level failures. The album is skipped untouched and the walk moves on.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Could not read track-list {path:?}: {source}")]
    TrackListUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid track-list {path:?}: {source}")]
    InvalidTrackList { path: PathBuf, source: CueError },

    #[error("Audio container not found: {0:?}")]
    ContainerNotFound(PathBuf),

    #[error("Could not determine duration of {path:?}: {source}")]
    DurationProbeFailure { path: PathBuf, source: CodecError },

    #[error("Could not create output directory {path:?}: {source}")]
    StagingDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type SplitResult<T> = Result<T, SplitError>;
