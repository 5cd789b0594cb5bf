pub mod context;
pub mod data_file;
pub mod feature;
pub mod motif;
pub mod peak;
pub mod pwm;
pub mod segment;
pub mod signal;

// re-export for cleaner imports
pub use self::context::AnalysisContext;
pub use self::data_file::{DataFile, DataFileKind};
pub use self::feature::{FeatureColumn, FeatureKey, FeatureValues, ValueType};
pub use self::motif::{Motif, MotifMode, iupac_mask};
pub use self::peak::{Peak, PeakLengths, PeakSet};
pub use self::pwm::{PositionWeightMatrix, PwmAggregate, parse_jaspar};
pub use self::segment::{BreakSegment, CodePair, Segment, SegmentSet};
pub use self::signal::{SignalInterval, SignalTrack};
