//! Symbio - genomic sequence analysis
//!
//! The core turns FASTA text into nucleotide composition, GC content, the
//! longest forward-strand open reading frame and a three-frame codon table.
//! It is pure and deterministic; storage, narrative generation and reporting
//! sit around it as separate collaborators.

pub mod config;
pub mod error;
pub mod logging;
pub mod narrative;
pub mod pipeline;
pub mod report;
pub mod sequence;
pub mod store;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use pipeline::{AnalysisPipeline, AnalysisResult, PipelineOptions, RawInput};
pub use sequence::{FastaError, ParsedRecord};
