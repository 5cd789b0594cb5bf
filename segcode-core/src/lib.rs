//! Core data model for segcode.
//!
//! Holds the peak sets that feed the segmentation, the coded segments it
//! produces, the motif/PWM definitions the scorer evaluates, and the
//! [`AnalysisContext`](models::AnalysisContext) that ties one analysis run
//! together.

pub mod config;
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{Result, SegcodeError};
