use thiserror::Error;

/// Structural problems that make a parsed track-list unusable for splitting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CueError {
    #[error("No FILE directive references an audio container")]
    NoContainerReference,

    #[error("No TRACK directives found")]
    NoTracks,

    #[error("Multiple audio containers referenced ({0:?}), only single-file albums are supported")]
    MultipleContainers(Vec<String>),

    #[error("Unsupported audio container type: {0}")]
    UnsupportedContainerType(String),
}

pub type CueResult<T> = Result<T, CueError>;
