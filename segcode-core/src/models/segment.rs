use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use md5::{Digest, Md5};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::feature::{FeatureKey, FeatureValues};
use crate::errors::SegcodeError;

///
/// Segment struct, a maximal genomic interval `[start, end)` with a constant
/// code. Bit `i` of `code` is set iff reference dataset `i` covers it.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub code: u32,
    /// 1-based ordinal of the segment in the set
    pub short_id: usize,
    /// `chr:start-end`
    pub long_id: String,
    /// shorter than the minimum segment length of the run
    pub short: bool,
    pub features: FeatureValues,
}

impl Segment {
    pub fn new(chr: &str, start: u32, end: u32, code: u32) -> Self {
        Segment {
            chr: chr.to_string(),
            start,
            end,
            code,
            short_id: 0,
            long_id: format!("{}:{}-{}", chr, start, end),
            short: false,
            features: FeatureValues::default(),
        }
    }

    pub fn length(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_long(&self) -> bool {
        !self.short
    }

    pub fn feature(&self, key: &FeatureKey) -> Option<f64> {
        self.features.get(key).copied()
    }

    /// Does `next` start exactly where this segment ends, on the same chromosome?
    pub fn abuts(&self, next: &Segment) -> bool {
        self.chr == next.chr && self.end == next.start
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chr, self.start, self.end, self.code
        )
    }
}

///
/// The coded segmentation of one analysis run, sorted by (chr, start).
///
#[derive(Debug, Clone, Default)]
pub struct SegmentSet {
    pub segments: Vec<Segment>,
    pub min_segment_length: u32,
    /// number of reference datasets, i.e. bits in a code
    pub dataset_count: usize,
    /// invalid peaks dropped while loading the inputs
    pub dropped_peaks: usize,
}

impl SegmentSet {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `2^dataset_count`
    pub fn number_of_codes(&self) -> usize {
        1usize << self.dataset_count
    }

    pub fn iter_long(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_long())
    }

    pub fn iter_short(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.short)
    }

    ///
    /// Iterate unique chromosomes in ascending order
    ///
    pub fn iter_chroms(&self) -> impl Iterator<Item = &String> {
        let unique: BTreeSet<&String> = self.segments.iter().map(|s| &s.chr).collect();
        unique.into_iter()
    }

    ///
    /// Split the set into runs of abutting segments. A run ends at a
    /// chromosome change or at a stretch of genome no dataset covers.
    ///
    pub fn contiguous_runs(&self) -> impl Iterator<Item = &[Segment]> {
        self.segments.chunk_by(|a, b| a.abuts(b))
    }

    ///
    /// Identifier of the segmentation: digest over coordinates and codes,
    /// independent of the scored features.
    ///
    pub fn identifier(&self) -> String {
        let mut hasher = Md5::new();
        for s in &self.segments {
            hasher.update(format!("{},{},{},{};", s.chr, s.start, s.end, s.code));
        }
        format!("{:x}", hasher.finalize())
    }
}

///
/// Ordered pair of codes, written `a-b`; the key of adjacency and chain views.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodePair(pub u32, pub u32);

impl Display for CodePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

impl FromStr for CodePair {
    type Err = SegcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.parse::<u32>()
                .map_err(|_| SegcodeError::Config(format!("invalid code pair: {}", s)))
        };
        match s.split_once('-') {
            Some((a, b)) => Ok(CodePair(parse(a)?, parse(b)?)),
            None => Err(SegcodeError::Config(format!("invalid code pair: {}", s))),
        }
    }
}

impl Serialize for CodePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CodePair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

///
/// A short segment inside a chain, with the code of the long segment that
/// precedes the chain.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakSegment {
    pub before_code: u32,
    pub break_code: u32,
    pub length: u32,
}

impl BreakSegment {
    /// Number of bits flipped between the surrounding and the break code.
    pub fn hamming_distance(&self) -> u32 {
        (self.before_code ^ self.break_code).count_ones()
    }
}
