use std::io;
use thiserror::Error;

/// Error type for reference genome access.
#[derive(Error, Debug)]
pub enum SequenceError {
    /// IO error while reading the genome or its index.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The genome file is compressed and can't be seeked into.
    #[error("Compressed genomes are not supported, decompress first: {0}")]
    Compressed(String),

    /// A `.fai` line could not be parsed.
    #[error("Invalid fasta index line {line}: {reason}")]
    InvalidIndex { line: usize, reason: String },

    /// The requested chromosome is not in the index.
    #[error("Unknown chromosome: {0}")]
    UnknownChrom(String),

    /// The requested range lies (partly) off the chromosome.
    #[error("Range {chr}:{start}-{end} is outside the chromosome (length {length})")]
    OutOfBounds {
        chr: String,
        start: u64,
        end: u64,
        length: u64,
    },
}

/// Result type alias for genome access.
pub type Result<T> = std::result::Result<T, SequenceError>;
