pub mod codon;
pub mod composition;
pub mod fasta;
pub mod orf;

pub use codon::CodonFrequency;
pub use composition::{CompositionResult, NucleotideCounts};
pub use fasta::{FastaError, ParsedRecord};
pub use orf::{OrfCandidate, OrfResult};
