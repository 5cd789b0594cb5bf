use std::io::BufRead;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;

use crate::errors::{Result, SegcodeError};
use crate::utils::{get_dynamic_reader, is_header_line};

/// One bedGraph record.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInterval {
    pub start: u32,
    pub end: u32,
    pub value: f64,
}

///
/// A measurement track (bedGraph) whose values are attached to segments as
/// additional data.
///
#[derive(Debug, Clone, Default)]
pub struct SignalTrack {
    intervals: FxHashMap<String, Vec<SignalInterval>>,
    pub dropped: usize,
    pub path: Option<PathBuf>,
}

impl TryFrom<&Path> for SignalTrack {
    type Error = SegcodeError;

    ///
    /// Read a bedGraph file (`chr start end value`), gzip'd or not.
    ///
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value)?;
        let mut track = SignalTrack {
            path: Some(value.to_owned()),
            ..Default::default()
        };

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() || is_header_line(line) {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();
            let parsed = match parts.as_slice() {
                [chr, start, end, value, ..] => match (
                    start.parse::<u32>(),
                    end.parse::<u32>(),
                    value.parse::<f64>(),
                ) {
                    (Ok(start), Ok(end), Ok(value)) if end > start && value.is_finite() => {
                        Some((chr.to_string(), SignalInterval { start, end, value }))
                    }
                    _ => None,
                },
                _ => None,
            };

            match parsed {
                Some((chr, interval)) => track.push(chr, interval),
                None => track.dropped += 1,
            }
        }

        if track.intervals.is_empty() {
            return Err(SegcodeError::EmptySignalTrack(value.display().to_string()));
        }

        track.sort();
        if let Some((chr, start)) = track.first_overlap() {
            return Err(SegcodeError::OverlappingSignal {
                path: value.display().to_string(),
                chr,
                start,
            });
        }
        Ok(track)
    }
}

/// Records must not overlap; [SignalTrack::mean_over] relies on it.
impl From<Vec<(&str, u32, u32, f64)>> for SignalTrack {
    fn from(records: Vec<(&str, u32, u32, f64)>) -> Self {
        let mut track = SignalTrack::default();
        for (chr, start, end, value) in records {
            track.push(chr.to_string(), SignalInterval { start, end, value });
        }
        track.sort();
        track
    }
}

impl SignalTrack {
    fn push(&mut self, chr: String, interval: SignalInterval) {
        self.intervals.entry(chr).or_default().push(interval);
    }

    fn sort(&mut self) {
        for intervals in self.intervals.values_mut() {
            intervals.sort_by_key(|iv| (iv.start, iv.end));
        }
    }

    /// Chromosome and start of the first record overlapping its predecessor.
    fn first_overlap(&self) -> Option<(String, u32)> {
        let mut chroms: Vec<&String> = self.intervals.keys().collect();
        chroms.sort();
        chroms.into_iter().find_map(|chr| {
            self.intervals[chr]
                .windows(2)
                .find(|w| w[1].start < w[0].end)
                .map(|w| (chr.clone(), w[1].start))
        })
    }

    ///
    /// Coverage-weighted mean of the track over `[start, end)`. Bases without
    /// a record contribute 0. Returns `None` for an empty window.
    ///
    pub fn mean_over(&self, chr: &str, start: u32, end: u32) -> Option<f64> {
        if end <= start {
            return None;
        }

        let Some(intervals) = self.intervals.get(chr) else {
            return Some(0.0);
        };

        // bedGraph records don't overlap, so ends are sorted as well
        let first = intervals.partition_point(|iv| iv.end <= start);
        let mut weighted = 0.0;
        for iv in &intervals[first..] {
            if iv.start >= end {
                break;
            }
            let overlap = iv.end.min(end).saturating_sub(iv.start.max(start));
            weighted += overlap as f64 * iv.value;
        }

        Some(weighted / (end - start) as f64)
    }

    pub fn len(&self) -> usize {
        self.intervals.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_mean_over_partial_coverage() {
        let track = SignalTrack::from(vec![("chr1", 0, 10, 2.0), ("chr1", 10, 20, 4.0)]);
        // half of the window at 2.0, half at 4.0
        assert_eq!(track.mean_over("chr1", 5, 15), Some(3.0));
        // uncovered bases count as zero
        assert_eq!(track.mean_over("chr1", 10, 30), Some(2.0));
        assert_eq!(track.mean_over("chr2", 0, 10), Some(0.0));
        assert_eq!(track.mean_over("chr1", 10, 10), None);
    }

    #[rstest]
    fn test_read_bedgraph() {
        let path = PathBuf::from("../tests/data/signal/expression_t1.bedgraph");
        let track = SignalTrack::try_from(path.as_path()).unwrap();
        assert!(track.len() > 0);
        assert_eq!(track.dropped, 0);
    }

    #[rstest]
    fn test_empty_bedgraph_is_an_error() {
        let path = PathBuf::from("../tests/data/signal/empty.bedgraph");
        let result = SignalTrack::try_from(path.as_path());
        assert!(matches!(result, Err(SegcodeError::EmptySignalTrack(_))));
    }

    #[rstest]
    fn test_overlapping_records_are_rejected() {
        let path = PathBuf::from("../tests/data/signal/overlapping.bedgraph");
        match SignalTrack::try_from(path.as_path()) {
            Err(SegcodeError::OverlappingSignal { chr, start, .. }) => {
                assert_eq!(chr, "chr1");
                assert_eq!(start, 40);
            }
            other => panic!("expected an overlap error, got {:?}", other),
        }
    }
}
