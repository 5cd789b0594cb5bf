//! Statistics over a coded segmentation.
//!
//! Adjacency, chains and breaks only look at segments that abut on the same
//! chromosome: a stretch of genome covered by no dataset ends a run.

use segcode_core::models::{BreakSegment, CodePair, FeatureColumn, Segment, SegmentSet};

use crate::correlation::correlation_matrix;
use crate::errors::Result;
use crate::fate::fate_of_code;
use crate::models::{
    BreakSegments, CodeDistribution, CorrelationMatrix, FateOfCode, FateOfCodeParameter,
    LengthDistributions, SegmentPairs, ShortSegmentChains,
};

/// Trait for computing the derived views of a segmentation.
pub trait SegmentSetStatistics {
    /// Number of segments per code, ascending by code.
    fn code_distribution(&self) -> CodeDistribution;

    /// Length histograms of long and short segments.
    fn length_distributions(&self) -> LengthDistributions;

    ///
    /// Count abutting pairs by kind (long-long, long-short, short-long) and
    /// code pair. The occurrence rate normalizes long-long counts by the
    /// total number of long-long pairs.
    ///
    fn segment_pairs(&self) -> SegmentPairs;

    ///
    /// Runs of one or more abutting short segments with a long segment
    /// directly on each side. Short segments at the edge of a run are not
    /// part of any chain.
    ///
    fn short_segment_chains(&self) -> ShortSegmentChains;

    /// One [BreakSegment] per short segment inside a chain.
    fn break_segments(&self) -> BreakSegments;

    ///
    /// Pearson correlation between `columns` over the long segments, using
    /// the observations where both columns have a value.
    ///
    fn correlation_matrix(&self, columns: &[FeatureColumn]) -> CorrelationMatrix;

    /// Transition counts from segment code to thresholded column code.
    fn fate_of_code(&self, param: &FateOfCodeParameter) -> Result<FateOfCode>;
}

/// A chain: the long segment before, the short segments, the long one after.
struct Chain<'a> {
    before: &'a Segment,
    shorts: &'a [Segment],
    after: &'a Segment,
}

impl Chain<'_> {
    fn key(&self) -> CodePair {
        CodePair(self.before.code, self.after.code)
    }
}

fn chains(set: &SegmentSet) -> Vec<Chain<'_>> {
    let mut found = Vec::new();
    for run in set.contiguous_runs() {
        let mut i = 0;
        while i < run.len() {
            if !run[i].short {
                i += 1;
                continue;
            }
            let first = i;
            while i < run.len() && run[i].short {
                i += 1;
            }
            if first > 0 && i < run.len() {
                found.push(Chain {
                    before: &run[first - 1],
                    shorts: &run[first..i],
                    after: &run[i],
                });
            }
        }
    }
    found
}

impl SegmentSetStatistics for SegmentSet {
    fn code_distribution(&self) -> CodeDistribution {
        let mut distribution = CodeDistribution::new();
        for segment in &self.segments {
            *distribution.entry(segment.code).or_default() += 1;
        }
        distribution
    }

    fn length_distributions(&self) -> LengthDistributions {
        let mut distributions = LengthDistributions::default();
        for segment in &self.segments {
            let histogram = if segment.short {
                &mut distributions.short_segments
            } else {
                &mut distributions.segments
            };
            *histogram.entry(segment.length()).or_default() += 1;
        }
        distributions
    }

    fn segment_pairs(&self) -> SegmentPairs {
        let mut pairs = SegmentPairs::default();
        for run in self.contiguous_runs() {
            for w in run.windows(2) {
                let key = CodePair(w[0].code, w[1].code);
                let map = match (w[0].short, w[1].short) {
                    (false, false) => &mut pairs.long_long,
                    (false, true) => &mut pairs.long_short,
                    (true, false) => &mut pairs.short_long,
                    (true, true) => continue,
                };
                *map.entry(key).or_default() += 1;
            }
        }

        pairs.total_long_pairs = pairs.long_long.values().sum();
        let total = pairs.total_long_pairs as f64;
        pairs.occurrence_rate = pairs
            .long_long
            .iter()
            .map(|(key, count)| (*key, *count as f64 / total))
            .collect();
        pairs
    }

    fn short_segment_chains(&self) -> ShortSegmentChains {
        let mut result = ShortSegmentChains::default();
        for chain in chains(self) {
            let key = chain.key();
            let length: u64 = chain.shorts.iter().map(|s| s.length() as u64).sum();
            *result.counts.entry(key).or_default() += 1;
            *result.lengths.entry(key).or_default() += length;
            *result.sizes.entry(chain.shorts.len()).or_default() += 1;
        }
        result
    }

    fn break_segments(&self) -> BreakSegments {
        let mut result = BreakSegments::default();
        for chain in chains(self) {
            for short in chain.shorts {
                let b = BreakSegment {
                    before_code: chain.before.code,
                    break_code: short.code,
                    length: short.length(),
                };
                *result.hamming.entry(b.hamming_distance()).or_default() += 1;
                *result
                    .lengths_by_before_code
                    .entry(b.before_code)
                    .or_default()
                    .entry(b.length)
                    .or_default() += 1;
                result.breaks.push(b);
            }
        }
        result
    }

    fn correlation_matrix(&self, columns: &[FeatureColumn]) -> CorrelationMatrix {
        correlation_matrix(self, columns)
    }

    fn fate_of_code(&self, param: &FateOfCodeParameter) -> Result<FateOfCode> {
        fate_of_code(self, param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use segcode_core::models::PeakSet;
    use segcode_segment::CodeAssigner;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data/peaks")
            .join(file_name)
    }

    #[fixture]
    fn fixture_set() -> SegmentSet {
        let sets: Vec<PeakSet> = ["dataset_a.bed", "dataset_b.bed", "dataset_c.bed.gz"]
            .iter()
            .map(|f| PeakSet::try_from(get_test_path(f)).unwrap())
            .collect();
        CodeAssigner::new(20).assign(&sets).unwrap()
    }

    fn make_set(segments: Vec<(&str, u32, u32, u32)>, min_length: u32) -> SegmentSet {
        SegmentSet {
            segments: segments
                .into_iter()
                .enumerate()
                .map(|(i, (chr, start, end, code))| {
                    let mut s = Segment::new(chr, start, end, code);
                    s.short_id = i + 1;
                    s.short = end - start < min_length;
                    s
                })
                .collect(),
            min_segment_length: min_length,
            dataset_count: 3,
            dropped_peaks: 0,
        }
    }

    fn pair_map(entries: &[(u32, u32, usize)]) -> BTreeMap<CodePair, usize> {
        entries
            .iter()
            .map(|(a, b, n)| (CodePair(*a, *b), *n))
            .collect()
    }

    #[rstest]
    fn test_code_distribution(fixture_set: SegmentSet) {
        let distribution = fixture_set.code_distribution();
        let expected: CodeDistribution =
            [(1, 4), (2, 3), (3, 3), (4, 2), (5, 3), (6, 2), (7, 2)].into_iter().collect();
        assert_eq!(distribution, expected);
        assert_eq!(distribution.values().sum::<usize>(), fixture_set.len());
    }

    #[rstest]
    fn test_length_distributions(fixture_set: SegmentSet) {
        let d = fixture_set.length_distributions();
        let long: BTreeMap<u32, usize> =
            [(20, 3), (30, 3), (35, 1), (40, 2), (50, 2), (70, 1)].into_iter().collect();
        let short: BTreeMap<u32, usize> = [(5, 1), (10, 6)].into_iter().collect();
        assert_eq!(d.segments, long);
        assert_eq!(d.short_segments, short);
    }

    #[rstest]
    fn test_segment_pairs(fixture_set: SegmentSet) {
        let pairs = fixture_set.segment_pairs();
        assert_eq!(
            pairs.long_long,
            pair_map(&[(1, 3, 1), (4, 5, 1), (5, 1, 1), (6, 2, 2)])
        );
        assert_eq!(
            pairs.long_short,
            pair_map(&[(1, 3, 1), (1, 5, 1), (3, 7, 1), (5, 7, 1)])
        );
        assert_eq!(
            pairs.short_long,
            pair_map(&[(3, 1, 1), (3, 2, 1), (4, 5, 1), (5, 4, 1), (7, 6, 2)])
        );
        assert_eq!(pairs.total_long_pairs, 5);
        assert_eq!(pairs.occurrence_rate[&CodePair(6, 2)], 0.4);
        let rate_sum: f64 = pairs.occurrence_rate.values().sum();
        assert!((rate_sum - 1.0).abs() < 1e-12);
    }

    #[rstest]
    fn test_short_segment_chains(fixture_set: SegmentSet) {
        let chains = fixture_set.short_segment_chains();
        assert_eq!(
            chains.counts,
            pair_map(&[(1, 2, 1), (1, 4, 1), (3, 6, 1), (5, 6, 1)])
        );
        assert!(chains.lengths.values().all(|l| *l == 10));
        assert_eq!(chains.sizes, BTreeMap::<usize, usize>::from([(1, 4)]));
    }

    #[rstest]
    fn test_break_segments(fixture_set: SegmentSet) {
        let breaks = fixture_set.break_segments();
        let triples: Vec<(u32, u32, u32)> = breaks
            .breaks
            .iter()
            .map(|b| (b.before_code, b.break_code, b.length))
            .collect();
        assert_eq!(triples, vec![(3, 7, 10), (1, 5, 10), (5, 7, 10), (1, 3, 10)]);
        assert_eq!(breaks.hamming, BTreeMap::<u32, usize>::from([(1, 4)]));
        assert_eq!(breaks.lengths_by_before_code[&1][&10], 2);
    }

    #[rstest]
    fn test_multi_segment_chain() {
        let set = make_set(
            vec![
                ("chr1", 0, 50, 1),
                ("chr1", 50, 55, 3),
                ("chr1", 55, 58, 2),
                ("chr1", 58, 100, 1),
            ],
            10,
        );
        let chains = set.short_segment_chains();
        assert_eq!(chains.counts, pair_map(&[(1, 1, 1)]));
        assert_eq!(chains.lengths[&CodePair(1, 1)], 8);
        assert_eq!(chains.sizes, BTreeMap::<usize, usize>::from([(2, 1)]));

        let breaks = set.break_segments();
        assert_eq!(breaks.breaks.len(), 2);
        assert_eq!(breaks.breaks[1].break_code, 2);
        assert_eq!(breaks.breaks[1].hamming_distance(), 2);

        // short-short steps are not counted as pairs
        let pairs = set.segment_pairs();
        assert_eq!(pairs.long_short, pair_map(&[(1, 3, 1)]));
        assert_eq!(pairs.short_long, pair_map(&[(2, 1, 1)]));
        assert!(pairs.long_long.is_empty());
        assert!(pairs.occurrence_rate.is_empty());
    }

    #[rstest]
    fn test_gap_breaks_chain() {
        let set = make_set(
            vec![("chr1", 0, 50, 1), ("chr1", 50, 55, 3), ("chr1", 60, 100, 1)],
            10,
        );
        assert!(set.short_segment_chains().counts.is_empty());
        assert!(set.break_segments().breaks.is_empty());
        assert!(set.segment_pairs().short_long.is_empty());
    }

    #[rstest]
    fn test_empty_set() {
        let set = make_set(vec![], 10);
        assert!(set.code_distribution().is_empty());
        assert_eq!(set.segment_pairs(), SegmentPairs::default());
    }
}
