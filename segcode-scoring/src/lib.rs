//! # Feature scoring
//!
//! Annotates the long segments of a segmentation with one value per
//! configured feature:
//!
//! - additional data: coverage-weighted mean of a bedGraph track
//! - consensus motifs: IUPAC match count or rate ([`MotifScanner`])
//! - position weight matrices: log-odds scan ([`PwmScanner`])
//!
//! Each segment's bases are read once; the sequence features are then
//! evaluated in parallel on a rayon pool.
pub mod errors;
pub mod evaluator;
pub mod motif;
pub mod pwm;
pub mod scorer;

pub use errors::ScoringError;
pub use evaluator::SequenceFeature;
pub use motif::MotifScanner;
pub use pwm::PwmScanner;
pub use scorer::{FeatureResult, FeatureScorer, ScoringReport, score_context};
