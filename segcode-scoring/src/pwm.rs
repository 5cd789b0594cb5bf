use segcode_core::models::{FeatureKey, PositionWeightMatrix, PwmAggregate};

use crate::errors::{Result, ScoringError};
use crate::evaluator::{SequenceFeature, base_index};

/// Uniform nucleotide background.
pub const BACKGROUND: f64 = 0.25;

///
/// Log-odds scanner built from a normalized [PositionWeightMatrix].
///
/// Every offset whose window holds only A, C, G or T is scored as
/// `sum ln(p / 0.25)`; windows touching any other symbol are skipped.
/// The window scores are then folded by the matrix's [PwmAggregate].
///
#[derive(Debug, Clone)]
pub struct PwmScanner {
    key: FeatureKey,
    forward: Vec<[f64; 4]>,
    reverse: Option<Vec<[f64; 4]>>,
    aggregate: PwmAggregate,
}

impl TryFrom<&PositionWeightMatrix> for PwmScanner {
    type Error = ScoringError;

    fn try_from(pwm: &PositionWeightMatrix) -> Result<Self> {
        if !pwm.normalized {
            return Err(ScoringError::UnnormalizedMatrix(pwm.id.clone()));
        }

        let forward: Vec<[f64; 4]> = pwm
            .rows
            .iter()
            .map(|row| row.map(|p| (p / BACKGROUND).ln()))
            .collect();

        // reverse complement: reversed positions, A<->T and C<->G
        let reverse = pwm.both_strands.then(|| {
            forward
                .iter()
                .rev()
                .map(|[a, c, g, t]| [*t, *g, *c, *a])
                .collect()
        });

        Ok(PwmScanner {
            key: FeatureKey::Pwm(pwm.id.clone()),
            forward,
            reverse,
            aggregate: pwm.aggregate,
        })
    }
}

impl PwmScanner {
    pub fn width(&self) -> usize {
        self.forward.len()
    }

    fn window_score(log_odds: &[[f64; 4]], window: &[u8]) -> Option<f64> {
        let mut score = 0.0;
        for (row, base) in log_odds.iter().zip(window) {
            score += row[base_index(*base)?];
        }
        Some(score)
    }

    ///
    /// Scores of all valid windows, forward strand first.
    ///
    pub fn scan(&self, seq: &[u8]) -> Vec<f64> {
        if seq.len() < self.width() {
            return Vec::new();
        }
        let strands = std::iter::once(&self.forward).chain(self.reverse.as_ref());
        strands
            .flat_map(|log_odds| {
                seq.windows(self.width())
                    .filter_map(move |w| Self::window_score(log_odds, w))
            })
            .collect()
    }
}

impl SequenceFeature for PwmScanner {
    fn key(&self) -> &FeatureKey {
        &self.key
    }

    fn evaluate(&self, seq: &[u8]) -> Option<f64> {
        let scores = self.scan(seq);
        if scores.is_empty() {
            return None;
        }
        let value = match self.aggregate {
            PwmAggregate::Max => scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            PwmAggregate::Sum => scores.iter().filter(|s| **s > 0.0).sum(),
            PwmAggregate::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
        };
        Some(value)
    }
}
