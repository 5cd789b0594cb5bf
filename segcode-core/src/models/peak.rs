use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SegcodeError};
use crate::utils::{get_dynamic_reader, is_header_line};

///
/// Peak struct, one interval of a peak (BED / narrowPeak) file.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    /// BED column 5 when present and numeric, 1.0 otherwise
    pub score: f64,
}

impl Peak {
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

impl Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.chr, self.start, self.end, self.score)
    }
}

/// Optional per-peak length columns of a BED12 file, imported as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakLengths {
    pub peak: Vec<u32>,
    pub thick: Vec<u32>,
    pub block: Vec<u32>,
}

///
/// PeakSet struct, the normalized content of one peak file: sorted by
/// (chr, start), with overlapping and abutting peaks coalesced.
///
#[derive(Clone, Debug, Default)]
pub struct PeakSet {
    pub peaks: Vec<Peak>,
    /// number of lines rejected as invalid peaks
    pub dropped: usize,
    /// number of input peaks absorbed by coalescing
    pub coalesced: usize,
    pub lengths: PeakLengths,
    pub path: Option<PathBuf>,
}

/// Outcome of parsing one data line of a peak file.
enum ParsedLine {
    Peak(Peak, Option<u32>, Option<u32>),
    Invalid,
}

fn parse_peak_line(line: &str) -> ParsedLine {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 3 {
        return ParsedLine::Invalid;
    }

    let (start, end) = match (parts[1].parse::<u32>(), parts[2].parse::<u32>()) {
        (Ok(start), Ok(end)) => (start, end),
        _ => return ParsedLine::Invalid,
    };

    if end <= start || parts[0].is_empty() {
        return ParsedLine::Invalid;
    }

    let score = parts
        .get(4)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite())
        .unwrap_or(1.0);

    let thick = match (parts.get(6), parts.get(7)) {
        (Some(ts), Some(te)) => match (ts.parse::<u32>(), te.parse::<u32>()) {
            (Ok(ts), Ok(te)) if te >= ts => Some(te - ts),
            _ => None,
        },
        _ => None,
    };

    let block = parts.get(10).and_then(|sizes| {
        sizes
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<u32>().ok())
            .sum::<Option<u32>>()
    });

    ParsedLine::Peak(
        Peak {
            chr: parts[0].to_string(),
            start,
            end,
            score,
        },
        thick,
        block,
    )
}

impl TryFrom<&Path> for PeakSet {
    type Error = SegcodeError;

    ///
    /// Create a new [PeakSet] from a bed or narrowPeak file, gzip'd or not.
    ///
    /// Lines that do not describe a valid peak (unparseable coordinates,
    /// `end <= start`) are dropped and counted in [PeakSet::dropped].
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value)?;

        let mut peaks: Vec<Peak> = Vec::new();
        let mut lengths = PeakLengths::default();
        let mut dropped = 0;
        let mut first_line = true;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();

            if line.is_empty() || is_header_line(line) {
                first_line = false;
                continue;
            }

            match parse_peak_line(line) {
                ParsedLine::Peak(peak, thick, block) => {
                    lengths.peak.push(peak.width());
                    if let Some(thick) = thick {
                        lengths.thick.push(thick);
                    }
                    if let Some(block) = block {
                        lengths.block.push(block);
                    }
                    peaks.push(peak);
                }
                // column header like `chr start end` without a leading #
                ParsedLine::Invalid if first_line => {}
                ParsedLine::Invalid => {
                    log::debug!("{}: dropping invalid peak line {:?}", value.display(), line);
                    dropped += 1;
                }
            }
            first_line = false;
        }

        if peaks.is_empty() {
            return Err(SegcodeError::EmptyPeakSet(value.display().to_string()));
        }

        let mut ps = PeakSet {
            peaks,
            dropped,
            coalesced: 0,
            lengths,
            path: Some(value.to_owned()),
        };
        ps.normalize();

        if ps.coalesced > 0 {
            log::info!(
                "{}: coalesced {} overlapping peaks",
                value.display(),
                ps.coalesced
            );
        }

        Ok(ps)
    }
}

impl TryFrom<&str> for PeakSet {
    type Error = SegcodeError;

    fn try_from(value: &str) -> Result<Self> {
        PeakSet::try_from(Path::new(value))
    }
}

impl TryFrom<PathBuf> for PeakSet {
    type Error = SegcodeError;

    fn try_from(value: PathBuf) -> Result<Self> {
        PeakSet::try_from(value.as_path())
    }
}

impl From<Vec<Peak>> for PeakSet {
    fn from(peaks: Vec<Peak>) -> Self {
        let (valid, invalid): (Vec<Peak>, Vec<Peak>) =
            peaks.into_iter().partition(|p| p.end > p.start);

        let mut ps = PeakSet {
            lengths: PeakLengths {
                peak: valid.iter().map(|p| p.width()).collect(),
                ..Default::default()
            },
            peaks: valid,
            dropped: invalid.len(),
            coalesced: 0,
            path: None,
        };
        ps.normalize();
        ps
    }
}

impl PeakSet {
    ///
    /// Sort peaks by (chr, start, end) and coalesce overlapping or abutting
    /// peaks. A merged peak keeps the highest score of its members.
    ///
    fn normalize(&mut self) {
        self.peaks.sort_by(|a, b| {
            a.chr
                .cmp(&b.chr)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });

        let mut merged: Vec<Peak> = Vec::with_capacity(self.peaks.len());
        for peak in self.peaks.drain(..) {
            match merged.last_mut() {
                Some(last) if last.chr == peak.chr && peak.start <= last.end => {
                    last.end = last.end.max(peak.end);
                    last.score = last.score.max(peak.score);
                    self.coalesced += 1;
                }
                _ => merged.push(peak),
            }
        }
        self.peaks = merged;
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    ///
    /// Iterate unique chromosomes of the PeakSet in ascending order
    ///
    pub fn iter_chroms(&self) -> impl Iterator<Item = &String> {
        let unique: BTreeSet<&String> = self.peaks.iter().map(|p| &p.chr).collect();
        unique.into_iter()
    }

    ///
    /// Peaks located on one chromosome. Peaks are sorted, so this is a
    /// contiguous slice.
    ///
    pub fn chr_peaks(&self, chr: &str) -> &[Peak] {
        let first = self.peaks.partition_point(|p| p.chr.as_str() < chr);
        let last = self.peaks.partition_point(|p| p.chr.as_str() <= chr);
        &self.peaks[first..last]
    }

    /// Total number of bases covered by the set.
    pub fn covered_bases(&self) -> u64 {
        self.peaks.iter().map(|p| p.width() as u64).sum()
    }
}
