//! Combinatorial segmentation of peak sets.
//!
//! Given K peak sets, [`CodeAssigner`] cuts the covered genome at every peak
//! boundary and labels each piece with a K-bit code: bit `i` is set iff
//! dataset `i` covers the piece.
//!
//! # Example
//!
//! ```no_run
//! use segcode_core::models::PeakSet;
//! use segcode_segment::CodeAssigner;
//!
//! let a = PeakSet::try_from("a.bed").unwrap();
//! let b = PeakSet::try_from("b.bed").unwrap();
//!
//! let segments = CodeAssigner::new(20).assign(&[a, b]).unwrap();
//! ```

pub mod assigner;
pub mod errors;

// re-exports
pub use assigner::{CodeAssigner, SegmentationSummary};
pub use errors::SegmentationError;
