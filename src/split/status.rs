use log::{error, info, warn};
use std::fmt;

/// Fixed prefix every outcome line starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Skip,
    Warn,
    Error,
    Cut,
    Move,
    Delete,
    Dry,
    Keep,
    Info,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Skip => "skip",
            Status::Warn => "warn",
            Status::Error => "error",
            Status::Cut => "cut",
            Status::Move => "move",
            Status::Delete => "delete",
            Status::Dry => "dry",
            Status::Keep => "keep",
            Status::Info => "info",
        }
    }

    pub fn log(&self, message: impl fmt::Display) {
        match self {
            Status::Error => error!("{self} {message}"),
            Status::Skip | Status::Warn => warn!("{self} {message}"),
            _ => info!("{self} {message}"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label())
    }
}
