use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("No datasets to segment")]
    NoDatasets,
    #[error("{0} datasets given, codes hold at most {1}")]
    TooManyDatasets(usize, usize),
    #[error("Score flags given for {flags} datasets, but there are {datasets}")]
    ScoreFlagMismatch { flags: usize, datasets: usize },
}
