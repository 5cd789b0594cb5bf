//! # Output of an analysis
//!
//! Writing segments to disk (BED and the semicolon-delimited data table)
//! and handing computed results to whatever consumes them, through a
//! [`ResultSink`].
pub mod bed;
pub mod error;
pub mod export;
pub mod publish;

pub use bed::*;
pub use error::*;
pub use export::*;
pub use publish::*;
