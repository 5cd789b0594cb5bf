use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::peak::PeakLengths;

/// Whether a file takes part in the code or only contributes measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFileKind {
    Reference,
    Additional,
}

///
/// A configured input file. Reference files define the code bits, in the
/// order of `data_list_number`; additional files carry measurements.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub kind: DataFileKind,
    /// report the covering peak's score instead of a 0/1 indicator
    pub use_score: bool,
    /// position in the feature matrix
    pub column_number: usize,
    /// position within its own list (the code bit, for reference files)
    pub data_list_number: usize,
    #[serde(skip)]
    pub lengths: PeakLengths,
}

impl DataFile {
    /// Bitmask of this file inside a code. Only meaningful for reference files.
    pub fn bit(&self) -> u32 {
        1 << self.data_list_number
    }
}
