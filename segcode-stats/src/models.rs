use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use segcode_core::models::{BreakSegment, CodePair, FeatureKey};

/// `code -> number of segments`
pub type CodeDistribution = BTreeMap<u32, usize>;

/// `length -> number of segments`
pub type LengthHistogram = BTreeMap<u32, usize>;

/// Length histograms of long and of short segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LengthDistributions {
    pub segments: LengthHistogram,
    pub short_segments: LengthHistogram,
}

///
/// Counts of abutting segment pairs keyed by `before-after` code.
///
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentPairs {
    /// long followed by long
    pub long_long: BTreeMap<CodePair, usize>,
    /// long followed by short
    pub long_short: BTreeMap<CodePair, usize>,
    /// short followed by long
    pub short_long: BTreeMap<CodePair, usize>,
    /// `long_long` divided by `total_long_pairs`
    pub occurrence_rate: BTreeMap<CodePair, f64>,
    pub total_long_pairs: usize,
}

///
/// Runs of short segments enclosed by two long segments, keyed by the codes
/// of the enclosing segments.
///
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShortSegmentChains {
    pub counts: BTreeMap<CodePair, usize>,
    /// summed length of the short segments
    pub lengths: BTreeMap<CodePair, u64>,
    /// `short segments in a chain -> number of chains`
    pub sizes: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BreakSegments {
    /// in segment order
    pub breaks: Vec<BreakSegment>,
    /// `hamming distance -> number of breaks`
    pub hamming: BTreeMap<u32, usize>,
    /// `before code -> length -> number of breaks`
    pub lengths_by_before_code: BTreeMap<u32, LengthHistogram>,
}

///
/// Symmetric Pearson correlation matrix over feature columns. Undefined
/// entries are `NaN`.
///
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrelationMatrix {
    pub keys: Vec<FeatureKey>,
    pub labels: Vec<String>,
    /// observations (long segments) the matrix was computed from
    pub observations: usize,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

///
/// Parameters of a fate-of-code analysis.
///
/// Each selection entry names a column ordinal and one additional data file
/// per reference dataset, in reference dataset order.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FateOfCodeParameter {
    pub selection: Vec<(usize, Vec<String>)>,
    pub threshold: f64,
}

/// `counts[from_code][to_code]` for one selected column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FateMatrix {
    pub column: usize,
    pub files: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FateOfCode {
    pub number_of_codes: usize,
    pub threshold: f64,
    /// in selection order
    pub matrices: Vec<FateMatrix>,
}
