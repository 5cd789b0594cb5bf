use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegcodeError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Corrupted file. 0 peaks found in the file: {0}")]
    EmptyPeakSet(String),

    #[error("No usable records in signal track: {0}")]
    EmptySignalTrack(String),

    #[error("Overlapping records in signal track {path} on {chr} at {start}")]
    OverlappingSignal {
        path: String,
        chr: String,
        start: u32,
    },

    #[error("Error parsing matrix: {0}")]
    MatrixParseError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported configuration file type: {0}")]
    UnsupportedConfigType(String),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SegcodeError>;
