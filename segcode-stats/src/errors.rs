use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Column {column} selects {found} files, one per reference dataset ({expected}) is required")]
    SelectionSize {
        column: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unknown additional data file: {0}")]
    UnknownDataFile(String),

    #[error("Fate-of-code needs at most {1} reference datasets, got {0}")]
    TooManyDatasets(usize, usize),

    #[error("Fate-of-code selection is empty")]
    EmptySelection,

    #[error("Threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
}

pub type Result<T> = std::result::Result<T, StatsError>;
