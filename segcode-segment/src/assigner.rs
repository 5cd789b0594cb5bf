use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;

use segcode_core::config::MAX_DATASETS;
use segcode_core::models::{AnalysisContext, FeatureKey, Peak, PeakSet, Segment, SegmentSet};

use crate::errors::SegmentationError;

/// A peak boundary seen by the sweep.
#[derive(Debug, Clone, Copy)]
struct Boundary {
    pos: u32,
    dataset: usize,
    opens: bool,
    score: f64,
}

///
/// Builds the coded segmentation of a list of peak sets.
///
/// The result does not depend on the order chromosomes are processed in:
/// the sweep is per chromosome and chromosomes are concatenated in
/// ascending order.
///
#[derive(Debug, Clone)]
pub struct CodeAssigner {
    pub min_segment_length: u32,
    /// per dataset: report the peak score instead of a 0/1 indicator
    pub use_score: Vec<bool>,
}

/// Counts describing a finished segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationSummary {
    pub identifier: String,
    pub chromosomes: usize,
    pub segments: usize,
    pub long_segments: usize,
    pub short_segments: usize,
    pub dropped_peaks: usize,
    pub min_segment_length: u32,
}

impl From<&SegmentSet> for SegmentationSummary {
    fn from(set: &SegmentSet) -> Self {
        let short_segments = set.iter_short().count();
        SegmentationSummary {
            identifier: set.identifier(),
            chromosomes: set.iter_chroms().count(),
            segments: set.len(),
            long_segments: set.len() - short_segments,
            short_segments,
            dropped_peaks: set.dropped_peaks,
            min_segment_length: set.min_segment_length,
        }
    }
}

impl CodeAssigner {
    pub fn new(min_segment_length: u32) -> Self {
        CodeAssigner {
            min_segment_length,
            use_score: Vec::new(),
        }
    }

    pub fn with_scores(mut self, use_score: Vec<bool>) -> Self {
        self.use_score = use_score;
        self
    }

    ///
    /// Segment the reference datasets of a context and store the result in
    /// it, replacing any earlier segmentation.
    ///
    pub fn segment_context(
        ctx: &mut AnalysisContext,
    ) -> Result<SegmentationSummary, SegmentationError> {
        let assigner = CodeAssigner::new(ctx.min_segment_length)
            .with_scores(ctx.datasets.iter().map(|d| d.use_score).collect());
        let set = assigner.assign(&ctx.peaks)?;
        let summary = SegmentationSummary::from(&set);
        ctx.segments = Some(set);
        Ok(summary)
    }

    ///
    /// Cut the union of all peak sets into segments of constant code.
    ///
    /// Dataset `i` contributes bit `1 << i`. Segments shorter than
    /// `min_segment_length` are kept and flagged short. Every segment also
    /// carries one [`FeatureKey::Dataset`] value per dataset.
    ///
    pub fn assign(&self, peak_sets: &[PeakSet]) -> Result<SegmentSet, SegmentationError> {
        if peak_sets.is_empty() {
            return Err(SegmentationError::NoDatasets);
        }
        if peak_sets.len() > MAX_DATASETS {
            return Err(SegmentationError::TooManyDatasets(
                peak_sets.len(),
                MAX_DATASETS,
            ));
        }
        if !self.use_score.is_empty() && self.use_score.len() != peak_sets.len() {
            return Err(SegmentationError::ScoreFlagMismatch {
                flags: self.use_score.len(),
                datasets: peak_sets.len(),
            });
        }

        let chroms: Vec<&String> = peak_sets
            .iter()
            .flat_map(|ps| ps.iter_chroms())
            .collect::<BTreeSet<&String>>()
            .into_iter()
            .collect();

        let per_chrom: Vec<Vec<Segment>> = chroms
            .par_iter()
            .map(|chr| {
                let chr_peaks: Vec<&[Peak]> =
                    peak_sets.iter().map(|ps| ps.chr_peaks(chr)).collect();
                self.assign_chrom(chr, &chr_peaks)
            })
            .collect();

        let mut segments: Vec<Segment> = per_chrom.into_iter().flatten().collect();
        for (i, segment) in segments.iter_mut().enumerate() {
            segment.short_id = i + 1;
            segment.short = segment.length() < self.min_segment_length;
        }

        let dropped_peaks = peak_sets.iter().map(|ps| ps.dropped).sum();
        log::info!(
            "Segmented {} datasets into {} segments on {} chromosomes",
            peak_sets.len(),
            segments.len(),
            chroms.len()
        );

        Ok(SegmentSet {
            segments,
            min_segment_length: self.min_segment_length,
            dataset_count: peak_sets.len(),
            dropped_peaks,
        })
    }

    fn dataset_value(&self, dataset: usize, score: f64) -> f64 {
        match self.use_score.get(dataset) {
            Some(true) => score,
            _ => 1.0,
        }
    }

    ///
    /// Sweep one chromosome. Peaks of one dataset are disjoint, so each
    /// dataset has at most one open peak at any position.
    ///
    fn assign_chrom(&self, chr: &str, peaks: &[&[Peak]]) -> Vec<Segment> {
        let mut boundaries: Vec<Boundary> = peaks
            .iter()
            .enumerate()
            .flat_map(|(dataset, ds_peaks)| {
                ds_peaks.iter().flat_map(move |p| {
                    [
                        Boundary {
                            pos: p.start,
                            dataset,
                            opens: true,
                            score: p.score,
                        },
                        Boundary {
                            pos: p.end,
                            dataset,
                            opens: false,
                            score: p.score,
                        },
                    ]
                })
            })
            .collect();
        // closing before opening at the same position
        boundaries.sort_by_key(|b| (b.pos, b.opens, b.dataset));

        let mut segments = Vec::new();
        let mut code: u32 = 0;
        let mut open_scores = vec![0.0; peaks.len()];
        let mut previous: Option<u32> = None;

        let mut i = 0;
        while i < boundaries.len() {
            let pos = boundaries[i].pos;

            if let Some(prev) = previous {
                if code != 0 && pos > prev {
                    let mut segment = Segment::new(chr, prev, pos, code);
                    for (dataset, score) in open_scores.iter().enumerate() {
                        let value = if code & (1 << dataset) != 0 {
                            self.dataset_value(dataset, *score)
                        } else {
                            0.0
                        };
                        segment.features.insert(FeatureKey::Dataset(dataset), value);
                    }
                    segments.push(segment);
                }
            }

            while i < boundaries.len() && boundaries[i].pos == pos {
                let b = boundaries[i];
                if b.opens {
                    code |= 1 << b.dataset;
                    open_scores[b.dataset] = b.score;
                } else {
                    code &= !(1 << b.dataset);
                    open_scores[b.dataset] = 0.0;
                }
                i += 1;
            }
            previous = Some(pos);
        }

        segments
    }
}
