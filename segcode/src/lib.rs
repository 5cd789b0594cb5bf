//! # segcode
//!
//! Cuts the genome covered by a set of peak files into segments of constant
//! presence code, scores the segments against additional data, motifs and
//! position weight matrices, and derives statistics from the result.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use segcode::engine::{Engine, Request};
//! use segcode::io::{MemorySink, ResultPublisher};
//!
//! let sink = MemorySink::new();
//! let mut engine = Engine::from_config(Path::new("analysis.toml"), ResultPublisher::new(sink.clone()))?;
//! engine.handle(Request::All)?;
//! for result in sink.results() {
//!     println!("{:?}", result.kind());
//! }
//! # Ok::<(), segcode::engine::EngineError>(())
//! ```
pub mod engine;

#[doc(inline)]
pub use segcode_core as core;

#[doc(inline)]
pub use segcode_seq as seq;

#[doc(inline)]
pub use segcode_segment as segment;

#[doc(inline)]
pub use segcode_scoring as scoring;

#[doc(inline)]
pub use segcode_stats as stats;

#[doc(inline)]
pub use segcode_io as io;

pub use engine::{Engine, EngineError, Request};
