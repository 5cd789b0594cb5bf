use thiserror::Error;

use segcode_seq::SequenceError;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("No segmentation to score, segment the datasets first")]
    NotSegmented,

    #[error("Matrix '{0}' must be normalized before scanning")]
    UnnormalizedMatrix(String),

    #[error("Invalid motif '{id}': {reason}")]
    InvalidMotif { id: String, reason: String },

    #[error("Could not build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
