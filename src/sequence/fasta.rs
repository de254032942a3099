//! FASTA validation and decoding.
//!
//! Accepts the text of a single FASTA record:
//!
//! ```text
//! >identifier optional description
//! ATGAAATAA...
//! ```
//!
//! Only the first record is decoded. Residues are restricted to A, T, G and C
//! (either case) and come back uppercased.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header used when the `>` line carries no text.
pub const UNKNOWN_HEADER: &str = "Unknown Header";

/// Validation failures raised while decoding FASTA text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FastaError {
    #[error("Invalid FASTA: missing header")]
    MissingHeader,

    #[error("Invalid characters in sequence. Only A, T, G, C are allowed (found '{found}' at residue {position}).")]
    InvalidCharacter { found: char, position: usize },

    #[error("Invalid FASTA format: No sequence found")]
    EmptySequence,
}

pub type FastaResult<T> = Result<T, FastaError>;

/// A decoded record. `sequence` is non-empty and only holds `A`, `T`, `G`, `C`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub header: String,
    pub sequence: String,
}

impl ParsedRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Decodes raw FASTA text into a header and a cleaned, uppercased sequence.
pub fn parse(text: &str) -> FastaResult<ParsedRecord> {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix('>') else {
        return Err(FastaError::MissingHeader);
    };

    let mut lines = body.split('\n');
    let header = match lines.next().map(str::trim) {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => UNKNOWN_HEADER.to_string(),
    };

    let mut sequence = String::with_capacity(body.len());
    let mut position = 0;
    for line in lines {
        if line.trim_start().starts_with('>') {
            warn!("Input holds more than one FASTA record; only '{header}' is analyzed");
            break;
        }
        for c in line.chars() {
            if c.is_whitespace() {
                continue;
            }
            position += 1;
            match c.to_ascii_uppercase() {
                upper @ ('A' | 'T' | 'G' | 'C') => sequence.push(upper),
                _ => return Err(FastaError::InvalidCharacter { found: c, position }),
            }
        }
    }

    if sequence.is_empty() {
        return Err(FastaError::EmptySequence);
    }

    debug!("Parsed FASTA record '{}' with {} residues", header, sequence.len());
    Ok(ParsedRecord { header, sequence })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_record() {
        let record = parse(">seq1\nATGAAATAA").unwrap();
        assert_eq!(record.header, "seq1");
        assert_eq!(record.sequence, "ATGAAATAA");
        assert_eq!(record.len(), 9);
    }

    #[test]
    fn test_multiline_sequence_and_whitespace() {
        let record = parse("  \n>seq1 description here \r\nATG AAA\r\n\tTAA\n\nccc \n").unwrap();
        assert_eq!(record.header, "seq1 description here");
        assert_eq!(record.sequence, "ATGAAATAACCC");
    }

    #[test]
    fn test_lowercase_is_normalized() {
        let record = parse(">s\natgcAtGc").unwrap();
        assert_eq!(record.sequence, "ATGCATGC");
    }

    #[test]
    fn test_empty_header_defaults() {
        let record = parse(">   \nACGT").unwrap();
        assert_eq!(record.header, UNKNOWN_HEADER);
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(parse("ATGC"), Err(FastaError::MissingHeader));
        assert_eq!(parse(""), Err(FastaError::MissingHeader));
        assert_eq!(parse("   \n  "), Err(FastaError::MissingHeader));
    }

    #[test]
    fn test_invalid_character() {
        let err = parse(">seq3\nXYZATG").unwrap_err();
        assert_eq!(err, FastaError::InvalidCharacter { found: 'X', position: 1 });
        assert!(err.to_string().contains("Only A, T, G, C are allowed"));

        let err = parse(">seq\nACGT\nACNT").unwrap_err();
        assert_eq!(err, FastaError::InvalidCharacter { found: 'N', position: 7 });
    }

    #[test]
    fn test_rna_uracil_is_rejected() {
        assert!(matches!(
            parse(">rna\nAUGC"),
            Err(FastaError::InvalidCharacter { found: 'U', .. })
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert_eq!(parse(">seq5\n"), Err(FastaError::EmptySequence));
        assert_eq!(parse(">seq5"), Err(FastaError::EmptySequence));
        assert_eq!(parse(">seq5\n  \n\t\n"), Err(FastaError::EmptySequence));
    }

    #[test]
    fn test_only_first_record_is_used() {
        let record = parse(">first\nACGT\nAC\n>second\nNNNN\n").unwrap();
        assert_eq!(record.header, "first");
        assert_eq!(record.sequence, "ACGTAC");
    }

    #[test]
    fn test_second_record_without_residues_in_first() {
        assert_eq!(parse(">first\n>second\nACGT"), Err(FastaError::EmptySequence));
    }
}
