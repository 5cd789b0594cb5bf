use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Serialize;

use segcode_core::models::{AnalysisContext, FeatureKey, SegmentSet, SignalTrack};
use segcode_seq::SequenceAccessor;

use crate::errors::{Result, ScoringError};
use crate::evaluator::SequenceFeature;
use crate::motif::MotifScanner;
use crate::pwm::PwmScanner;

/// Values of one feature, as `(short_id, value)` in segment order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureResult {
    pub key: FeatureKey,
    pub values: Vec<(usize, f64)>,
}

/// Outcome of one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringReport {
    pub results: Vec<FeatureResult>,
    /// long segments offered to the scorer
    pub scored_segments: usize,
    /// long segments whose bases could not be read
    pub skipped_segments: usize,
}

impl ScoringReport {
    pub fn result(&self, key: &FeatureKey) -> Option<&FeatureResult> {
        self.results.iter().find(|r| &r.key == key)
    }
}

fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        pb.set_style(style);
    }
    pb
}

///
/// Scores the long segments of a [SegmentSet].
///
/// Segments are visited one after the other; for each one the bases are
/// fetched once and every sequence feature is evaluated on them in
/// parallel. Values land in the segment's feature map under the feature's
/// key.
///
pub struct FeatureScorer {
    features: Vec<Box<dyn SequenceFeature>>,
    quiet: bool,
}

impl FeatureScorer {
    pub fn new() -> Self {
        FeatureScorer {
            features: Vec::new(),
            quiet: true,
        }
    }

    /// Scanners for every motif and PWM of the context, in column order.
    pub fn from_context(ctx: &AnalysisContext) -> Result<Self> {
        let mut scorer = FeatureScorer::new();
        for motif in &ctx.motifs {
            scorer.add_feature(Box::new(MotifScanner::try_from(motif)?));
        }
        for pwm in &ctx.pwms {
            scorer.add_feature(Box::new(PwmScanner::try_from(pwm)?));
        }
        Ok(scorer)
    }

    pub fn add_feature(&mut self, feature: Box<dyn SequenceFeature>) {
        self.features.push(feature);
    }

    /// Show a progress bar while scanning.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.quiet = !show;
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    ///
    /// Attach the coverage-weighted mean of each track to every long
    /// segment. Needs no genome access.
    ///
    pub fn score_signals(
        &self,
        segments: &mut SegmentSet,
        tracks: &[(FeatureKey, &SignalTrack)],
    ) -> Vec<FeatureResult> {
        let mut results: Vec<FeatureResult> = tracks
            .iter()
            .map(|(key, _)| FeatureResult {
                key: key.clone(),
                values: Vec::new(),
            })
            .collect();

        for segment in segments.segments.iter_mut().filter(|s| s.is_long()) {
            for ((key, track), result) in tracks.iter().zip(results.iter_mut()) {
                match track.mean_over(&segment.chr, segment.start, segment.end) {
                    Some(value) => {
                        segment.features.insert(key.clone(), value);
                        result.values.push((segment.short_id, value));
                    }
                    None => {
                        segment.features.remove(key);
                    }
                }
            }
        }
        results
    }

    ///
    /// Evaluate every sequence feature on every long segment.
    ///
    /// A segment whose bases can't be read is logged, counted as skipped and
    /// left without values for these features.
    ///
    pub fn score_sequences(
        &self,
        segments: &mut SegmentSet,
        accessor: &dyn SequenceAccessor,
        pool: &ThreadPool,
    ) -> ScoringReport {
        let mut report = ScoringReport {
            results: self
                .features
                .iter()
                .map(|f| FeatureResult {
                    key: f.key().clone(),
                    values: Vec::new(),
                })
                .collect(),
            ..Default::default()
        };
        let long_count = segments.iter_long().count();
        if self.features.is_empty() {
            report.scored_segments = long_count;
            return report;
        }

        let pb = progress_bar(long_count, self.quiet);
        pb.set_message("Scoring segments");

        for segment in segments.segments.iter_mut().filter(|s| s.is_long()) {
            pb.inc(1);
            report.scored_segments += 1;

            for feature in &self.features {
                segment.features.remove(feature.key());
            }

            let seq = match accessor.fetch_segment(segment) {
                Ok(seq) => seq,
                Err(e) => {
                    log::warn!("Skipping segment {}: {}", segment.long_id, e);
                    report.skipped_segments += 1;
                    continue;
                }
            };

            let short_id = segment.short_id;
            let slot = Mutex::new(&mut segment.features);
            pool.install(|| {
                self.features.par_iter().for_each(|feature| {
                    if let Some(value) = feature.evaluate(&seq) {
                        let mut features = slot.lock().unwrap_or_else(|e| e.into_inner());
                        features.insert(feature.key().clone(), value);
                    }
                });
            });
            let features = slot.into_inner().unwrap_or_else(|e| e.into_inner());

            for result in report.results.iter_mut() {
                if let Some(value) = features.get(&result.key) {
                    result.values.push((short_id, *value));
                }
            }
        }

        pb.finish_and_clear();
        log::info!(
            "Scored {} features on {} segments ({} skipped)",
            self.features.len(),
            report.scored_segments,
            report.skipped_segments
        );
        report
    }
}

impl Default for FeatureScorer {
    fn default() -> Self {
        FeatureScorer::new()
    }
}

///
/// Score the context's segmentation: additional data first, then motifs and
/// PWMs. Fails only when there is nothing to score or a feature definition
/// can't be compiled.
///
pub fn score_context(
    ctx: &mut AnalysisContext,
    accessor: &dyn SequenceAccessor,
    pool: &ThreadPool,
    show_progress: bool,
) -> Result<ScoringReport> {
    let scorer = FeatureScorer::from_context(ctx)?.with_progress(show_progress);

    let AnalysisContext {
        segments,
        additional,
        signals,
        ..
    } = ctx;
    let segments = segments.as_mut().ok_or(ScoringError::NotSegmented)?;

    let tracks: Vec<(FeatureKey, &SignalTrack)> = additional
        .iter()
        .zip(signals.iter())
        .map(|(file, track)| (FeatureKey::Additional(file.id.clone()), track))
        .collect();

    let signal_results = scorer.score_signals(segments, &tracks);
    let mut report = scorer.score_sequences(segments, accessor, pool);

    let mut results = signal_results;
    results.append(&mut report.results);
    report.results = results;
    Ok(report)
}
