//! # Segment statistics
//!
//! Read-only views derived from a coded [`SegmentSet`](segcode_core::models::SegmentSet):
//! code and length distributions, adjacency of codes, chains of short
//! segments and the breaks inside them, a Pearson correlation matrix over
//! the feature columns, and fate-of-code transition matrices.
//!
//! Every view is a pure function of the segment set, so views may be
//! computed concurrently.
pub mod correlation;
pub mod errors;
pub mod fate;
pub mod models;
pub mod statistics;

pub use correlation::pearson;
pub use errors::StatsError;
pub use fate::MAX_FATE_DATASETS;
pub use models::*;
pub use statistics::SegmentSetStatistics;
