use std::io;
use thiserror::Error;

use crate::publish::ResultKind;

/// Error type for writing segments to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// There is nothing to export yet.
    #[error("No segmentation to export")]
    NotSegmented,
}

/// Error type for publishing results.
#[derive(Error, Debug)]
pub enum PublishError {
    /// A request of the same kind is still being computed.
    #[error("A {0} request is already running")]
    AlreadyRunning(ResultKind),

    #[error("Could not serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The receiving end of a channel sink is gone.
    #[error("Result receiver disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, PublishError>;
