use segcode_core::models::{FeatureKey, Motif, MotifMode, iupac_mask};

use crate::errors::{Result, ScoringError};
use crate::evaluator::SequenceFeature;

fn base_mask(base: u8) -> u8 {
    match base {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' => 0b1000,
        _ => 0,
    }
}

/// Complement of an IUPAC mask: swap A<->T and C<->G.
fn complement_mask(mask: u8) -> u8 {
    ((mask & 0b0001) << 3) | ((mask & 0b0010) << 1) | ((mask & 0b0100) >> 1) | ((mask & 0b1000) >> 3)
}

///
/// Scans sequences for a consensus motif. Matches may overlap. On both
/// strands an offset counts once even if both strands match there.
///
#[derive(Debug, Clone)]
pub struct MotifScanner {
    key: FeatureKey,
    forward: Vec<u8>,
    reverse: Option<Vec<u8>>,
    mode: MotifMode,
}

impl TryFrom<&Motif> for MotifScanner {
    type Error = ScoringError;

    fn try_from(motif: &Motif) -> Result<Self> {
        let forward = motif
            .pattern
            .bytes()
            .map(|b| {
                iupac_mask(b).ok_or_else(|| ScoringError::InvalidMotif {
                    id: motif.id.clone(),
                    reason: format!("symbol '{}' is not an IUPAC code", b as char),
                })
            })
            .collect::<Result<Vec<u8>>>()?;
        if forward.is_empty() {
            return Err(ScoringError::InvalidMotif {
                id: motif.id.clone(),
                reason: "empty pattern".to_string(),
            });
        }

        let reverse = motif
            .both_strands
            .then(|| forward.iter().rev().map(|m| complement_mask(*m)).collect());

        Ok(MotifScanner {
            key: FeatureKey::Motif(motif.id.clone()),
            forward,
            reverse,
            mode: motif.mode,
        })
    }
}

impl MotifScanner {
    pub fn width(&self) -> usize {
        self.forward.len()
    }

    fn matches_at(masks: &[u8], window: &[u8]) -> bool {
        masks
            .iter()
            .zip(window)
            .all(|(m, b)| m & base_mask(*b) != 0)
    }

    /// Offsets where the motif matches, on either scanned strand.
    pub fn count(&self, seq: &[u8]) -> usize {
        if seq.len() < self.width() {
            return 0;
        }
        seq.windows(self.width())
            .filter(|w| {
                Self::matches_at(&self.forward, w)
                    || self
                        .reverse
                        .as_ref()
                        .is_some_and(|rev| Self::matches_at(rev, w))
            })
            .count()
    }
}

impl SequenceFeature for MotifScanner {
    fn key(&self) -> &FeatureKey {
        &self.key
    }

    fn evaluate(&self, seq: &[u8]) -> Option<f64> {
        let count = self.count(seq) as f64;
        match self.mode {
            MotifMode::Count => Some(count),
            MotifMode::Rate => {
                if seq.len() < self.width() {
                    return None;
                }
                let offsets = (seq.len() - self.width() + 1) as f64;
                Some(count / offsets)
            }
        }
    }
}
