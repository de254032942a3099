//! Orchestrates parsing and the three analyses into one [`AnalysisResult`].

use std::thread;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::sequence::{codon, composition, fasta, orf};
use crate::sequence::{CodonFrequency, CompositionResult, FastaError, OrfResult, ParsedRecord};

pub const DEFAULT_FILENAME: &str = "unknown.fasta";

/// Owner strings that stand for an anonymous upload.
const GUEST_OWNERS: [&str; 3] = ["", "null", "guest"];

/// Maps placeholder owner values to `None`.
pub fn normalize_owner(owner: Option<&str>) -> Option<String> {
    owner
        .map(str::trim)
        .filter(|o| !GUEST_OWNERS.contains(o))
        .map(str::to_string)
}

/// One upload as received from a client.
#[derive(Debug, Clone)]
pub struct RawInput {
    pub text: String,
    pub suggested_filename: Option<String>,
    pub owner: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl RawInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_filename: None,
            owner: None,
            uploaded_at: Utc::now(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.suggested_filename = Some(filename.into());
        self
    }

    pub fn with_owner(mut self, owner: Option<&str>) -> Self {
        self.owner = normalize_owner(owner);
        self
    }

    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = uploaded_at;
        self
    }
}

/// Caller-supplied facts carried alongside the computed figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    pub record: ParsedRecord,
    pub composition: CompositionResult,
    pub orf: OrfResult,
    pub codon_frequency: CodonFrequency,
}

impl AnalysisResult {
    pub fn filename(&self) -> &str {
        &self.metadata.filename
    }

    pub fn length(&self) -> usize {
        self.composition.length
    }

    pub fn gc_percent(&self) -> f64 {
        self.composition.gc_percent
    }

    pub fn orf_detected(&self) -> bool {
        self.orf.detected()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel: num_cpus::get() > 1,
        }
    }
}

/// Stateless runner; every call is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisPipeline {
    options: PipelineOptions,
}

impl AnalysisPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Parses `input` and analyzes its sequence. Parser errors abort the run
    /// before any analysis happens.
    pub fn run(&self, input: &RawInput) -> Result<AnalysisResult, FastaError> {
        let record = fasta::parse(&input.text)?;
        let filename = input
            .suggested_filename
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();

        debug!(
            "Analyzing '{}' ({} bp, parallel: {})",
            filename,
            record.len(),
            self.options.parallel
        );
        let (composition, orf, codon_frequency) = if self.options.parallel {
            analyze_parallel(&record.sequence)
        } else {
            analyze_serial(&record.sequence)
        };

        info!(
            "Analyzed '{}': {} bp, GC {:.2}%, ORF detected: {}",
            filename,
            composition.length,
            composition.gc_percent,
            orf.detected()
        );

        Ok(AnalysisResult {
            metadata: AnalysisMetadata {
                filename,
                uploaded_at: input.uploaded_at,
                owner: input.owner.clone(),
            },
            record,
            composition,
            orf,
            codon_frequency,
        })
    }
}

fn analyze_serial(sequence: &str) -> (CompositionResult, OrfResult, CodonFrequency) {
    (
        composition::analyze(sequence),
        orf::scan(sequence),
        codon::count(sequence),
    )
}

/// Composition and codon counting on scoped threads, the ORF scan here.
fn analyze_parallel(sequence: &str) -> (CompositionResult, OrfResult, CodonFrequency) {
    thread::scope(|s| {
        let composition = s.spawn(|| composition::analyze(sequence));
        let codons = s.spawn(|| codon::count(sequence));
        let orf = orf::scan(sequence);

        let composition = composition
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        let codons = codons
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        (composition, orf, codons)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::NucleotideCounts;
    use chrono::TimeZone;

    fn run(text: &str) -> Result<AnalysisResult, FastaError> {
        AnalysisPipeline::default().run(&RawInput::new(text).with_filename("test.fasta"))
    }

    #[test]
    fn test_scenario_simple_orf() {
        let result = run(">seq1\nATGAAATAA").unwrap();
        assert_eq!(result.record.header, "seq1");
        assert_eq!(result.length(), 9);
        assert_eq!(result.composition.counts, NucleotideCounts { a: 6, t: 2, g: 1, c: 0 });
        assert!((result.gc_percent() - 11.11).abs() < 0.01);
        assert!(result.orf_detected());
        assert_eq!(result.orf.sequence(), Some("ATGAAATAA"));
        assert_eq!(result.orf.start_index(), Some(0));
        assert_eq!(result.orf.end_index_exclusive(), Some(9));
        assert_eq!(result.orf.frame(), Some(0));
    }

    #[test]
    fn test_scenario_no_orf() {
        let result = run(">seq2\nGGCGCGCC").unwrap();
        assert!(!result.orf_detected());
        assert_eq!(result.orf.sequence(), None);
        assert_eq!(result.gc_percent(), 100.0);
    }

    #[test]
    fn test_scenario_validation_errors() {
        assert!(matches!(run(">seq3\nXYZATG"), Err(FastaError::InvalidCharacter { .. })));
        assert_eq!(run("ATGC"), Err(FastaError::MissingHeader));
        assert_eq!(run(">seq5\n"), Err(FastaError::EmptySequence));
    }

    #[test]
    fn test_scenario_tie_breaks_on_earliest_start() {
        let result = run(">seq6\nATGTTTTAAATGCCCTAG").unwrap();
        assert_eq!(result.orf.start_index(), Some(0));
        assert_eq!(result.orf.sequence(), Some("ATGTTTTAA"));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let text = ">mixed\nAATGCCCTGATGGGGAAATTTTAGCATGTAATGAGGCCCATATATGCGCGTAGTTTAAC";
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let input = RawInput::new(text).with_uploaded_at(at);
        let serial = AnalysisPipeline::new(PipelineOptions { parallel: false }).run(&input).unwrap();
        let parallel = AnalysisPipeline::new(PipelineOptions { parallel: true }).run(&input).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_metadata_defaults() {
        let result = AnalysisPipeline::default()
            .run(&RawInput::new(">s\nACGT").with_filename("  ").with_owner(Some("guest")))
            .unwrap();
        assert_eq!(result.filename(), DEFAULT_FILENAME);
        assert_eq!(result.metadata.owner, None);
    }

    #[test]
    fn test_normalize_owner() {
        assert_eq!(normalize_owner(None), None);
        assert_eq!(normalize_owner(Some("null")), None);
        assert_eq!(normalize_owner(Some(" ")), None);
        assert_eq!(normalize_owner(Some("guest")), None);
        assert_eq!(normalize_owner(Some(" user-1 ")), Some("user-1".to_string()));
    }

    #[test]
    fn test_codon_totals_follow_length() {
        let result = run(">s\nATGCGTACGTTAGCAGG").unwrap();
        let len = result.length();
        let expected: usize = (0..3).map(|f| (len - f) / 3).sum();
        assert_eq!(result.codon_frequency.total(), expected);
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let result = run(">seq1 some gene\nATGAAATAAGC").unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata, result.metadata);
        assert_eq!(back.record, result.record);
        assert_eq!(back.orf, result.orf);
        assert_eq!(back.codon_frequency, result.codon_frequency);
        assert_eq!(back.composition.counts, result.composition.counts);
        assert!((back.gc_percent() - result.gc_percent()).abs() < 1e-9);
    }
}
