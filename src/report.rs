//! Human-readable renderings of stored records.
//!
//! Every figure shown comes from the record as stored; nothing is recomputed
//! except per-base percentages derived from stored counts.

use std::fmt::{self, Write};

use chrono::Local;

use crate::pipeline::AnalysisResult;
use crate::store::StoredRecord;

const RULE: &str = "===========================================";

/// Codons listed in the report's frequency table.
pub const TOP_CODONS: usize = 10;

/// Suffixes stripped from upload names when naming reports.
const SEQUENCE_SUFFIXES: [&str; 3] = [".fasta", ".fa", ".txt"];

/// `report-<stem>.<extension>`, with a known sequence suffix removed from `filename`.
pub fn report_filename(filename: &str, extension: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    let stem = SEQUENCE_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map_or(filename, |suffix| &filename[..filename.len() - suffix.len()]);
    format!("report-{stem}.{extension}")
}

/// The stored record back as FASTA text.
pub fn fasta_export(record: &StoredRecord) -> String {
    let parsed = &record.analysis.record;
    format!(">{}\n{}", parsed.header, parsed.sequence)
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "{title}:")?;
    writeln!(out, "{}", "-".repeat(title.len() + 1))
}

/// Plain text report for a stored record.
pub fn render_record(record: &StoredRecord) -> String {
    render_text(&record.analysis, &record.interpretation)
}

/// Plain text report for one analysis and its interpretation.
pub fn render_text(analysis: &AnalysisResult, interpretation: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, analysis, interpretation);
    out
}

fn write_report(out: &mut String, analysis: &AnalysisResult, interpretation: &str) -> fmt::Result {
    let composition = &analysis.composition;

    writeln!(out, "{RULE}")?;
    writeln!(out, "GENOMIC SEQUENCE ANALYSIS REPORT")?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;

    section(out, "File Information")?;
    writeln!(out, "Filename: {}", analysis.filename())?;
    writeln!(out, "Header: {}", analysis.record.header)?;
    writeln!(
        out,
        "Analysis Date: {}",
        analysis.metadata.uploaded_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out)?;

    section(out, "Sequence Metrics")?;
    writeln!(out, "Sequence Length: {} base pairs", composition.length)?;
    writeln!(out, "GC Content: {:.2}%", composition.gc_percent)?;
    writeln!(out, "ORF Detected: {}", if analysis.orf_detected() { "Yes" } else { "No" })?;
    writeln!(out)?;

    section(out, "Nucleotide Composition")?;
    for (name, base) in [("Adenine", 'A'), ("Thymine", 'T'), ("Guanine", 'G'), ("Cytosine", 'C')] {
        writeln!(
            out,
            "{name} ({base}): {} ({:.2}%)",
            composition.counts.get(base),
            composition.base_percent(base)
        )?;
    }
    writeln!(out)?;

    section(out, "Open Reading Frame")?;
    match analysis.orf.candidate() {
        Some(orf) => {
            writeln!(out, "Frame: {}", orf.frame)?;
            writeln!(out, "Position: {}..{} ({} bp)", orf.start, orf.end, orf.len())?;
            writeln!(out, "Sequence: {}", orf.sequence)?;
        }
        None => writeln!(out, "No terminated ORF found in the forward frames.")?,
    }
    writeln!(out)?;

    section(out, "Codon Frequency (frames 0-2 combined)")?;
    let codons = &analysis.codon_frequency;
    writeln!(out, "Total codons: {}, distinct: {}", codons.total(), codons.len())?;
    for (codon, n) in codons.most_common().into_iter().take(TOP_CODONS) {
        writeln!(out, "{codon}: {n}")?;
    }
    writeln!(out)?;

    section(out, "Biological Interpretation")?;
    writeln!(out, "{interpretation}")?;
    writeln!(out)?;

    writeln!(out, "{RULE}")?;
    writeln!(out, "End of Report")?;
    write!(out, "{RULE}")
}
