//! # Reference genome access
//!
//! The scorer reads each segment's bases through the [`SequenceAccessor`]
//! trait. [`IndexedFasta`] seeks into a plain FASTA file using a samtools
//! `.fai` index (built on the fly when the file has none); [`InMemoryGenome`]
//! keeps small genomes in memory.
pub mod accessor;
pub mod errors;
pub mod fai;

pub use accessor::*;
pub use errors::*;
pub use fai::*;
