//! Free-text interpretation of analysis results.
//!
//! A hosted language model writes the prose when one is configured. Single
//! result interpretations fall back to a fixed template built from the same
//! figures, so analysis never depends on the service being reachable.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::AnalysisResult;
use crate::sequence::NucleotideCounts;
use crate::store::StoredRecord;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reply used when there is nothing to summarize.
pub const EMPTY_SUMMARY: &str = "No sequences found to summarize.";

/// The figures a narrator is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeSummary {
    pub filename: String,
    pub length: usize,
    pub gc_percent: f64,
    pub orf_detected: bool,
    pub nucleotide_counts: NucleotideCounts,
}

impl From<&AnalysisResult> for NarrativeSummary {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            filename: result.filename().to_string(),
            length: result.length(),
            gc_percent: result.gc_percent(),
            orf_detected: result.orf_detected(),
            nucleotide_counts: result.composition.counts,
        }
    }
}

pub trait Narrator {
    /// A short biological reading of one result.
    fn interpret(&self, summary: &NarrativeSummary) -> Result<String>;

    /// An overview of several stored results.
    fn summarize(&self, records: &[StoredRecord]) -> Result<String>;
}

/// Deterministic interpretation built only from `summary`.
pub fn fallback_interpretation(summary: &NarrativeSummary) -> String {
    let mut text = format!(
        "The analyzed sequence {} contains {} base pairs. ",
        summary.filename, summary.length
    );
    if summary.gc_percent > 50.0 {
        text.push_str("This sequence shows high GC content, indicating potentially higher thermal stability. ");
    }
    if summary.orf_detected {
        text.push_str("A valid ORF was detected, suggesting a potential protein-coding region.");
    } else {
        text.push_str("No valid ORF was detected, suggesting a non-coding or incomplete region.");
    }
    text
}

/// Asks `narrator` when given one, otherwise or on failure uses the template.
pub fn interpret_or_fallback(narrator: Option<&dyn Narrator>, summary: &NarrativeSummary) -> String {
    let Some(narrator) = narrator else {
        debug!("No narrator configured, using template interpretation");
        return fallback_interpretation(summary);
    };
    match narrator.interpret(summary) {
        Ok(text) => text,
        Err(e) => {
            warn!("Interpretation failed, falling back to template: {e}");
            fallback_interpretation(summary)
        }
    }
}

/// Summarizes stored records; an empty slice never reaches the narrator.
/// Unlike interpretations there is no template to fall back on.
pub fn summarize_records(narrator: Option<&dyn Narrator>, records: &[StoredRecord]) -> Result<String> {
    if records.is_empty() {
        return Ok(EMPTY_SUMMARY.to_string());
    }
    let Some(narrator) = narrator else {
        return Err(Error::Config("GEMINI_API_KEY is not set; summaries need the narrative service".to_string()));
    };
    narrator.summarize(records).map_err(|e| {
        warn!("Summary generation failed: {e}");
        Error::Narrative("Failed to generate summary".to_string())
    })
}

pub fn interpretation_prompt(summary: &NarrativeSummary) -> String {
    let counts = &summary.nucleotide_counts;
    format!(
        "As a bioinformatics expert, provide a concise (2-3 sentences) biological interpretation for this DNA sequence:\n\
         \n\
         Filename: {}\n\
         Length: {} bp\n\
         GC Content: {:.2}%\n\
         ORF Detected: {}\n\
         Nucleotide Counts: A={}, T={}, G={}, C={}\n\
         Also say whether it looks like a gene, RNA or other DNA, and whether it may belong to a particular species.\n\
         \n\
         Explain what the GC content implies about stability and what the ORF status suggests about coding potential.\n\
         Do not use markdown headers or bullet points, just a paragraph.",
        summary.filename,
        summary.length,
        summary.gc_percent,
        yes_no(summary.orf_detected),
        counts.a,
        counts.t,
        counts.g,
        counts.c,
    )
}

pub fn summary_prompt(records: &[StoredRecord]) -> String {
    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "- {}: {}bp, GC={:.2}%, ORF={}. {}",
                r.analysis.filename(),
                r.analysis.length(),
                r.analysis.gc_percent(),
                yes_no(r.analysis.orf_detected()),
                r.interpretation
            )
        })
        .collect();
    format!(
        "Analyze the following biological sequence data and provide a concise, scientific summary of the recent activity and findings.\n\
         Highlight any patterns, interesting observations about GC content or ORFs, and the overall nature of the analyzed sequences.\n\
         Keep it professional and insightful for a researcher.\n\
         \n\
         Data:\n{}",
        lines.join("\n")
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiNarrator {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiNarrator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        config
            .api_key
            .as_deref()
            .map(|key| Self::new(key, config.model.clone(), config.api_timeout))
            .transpose()
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        info!("Requesting text from model {}", self.model);
        let response: Value = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        extract_text(&response)
    }
}

impl Narrator for GeminiNarrator {
    fn interpret(&self, summary: &NarrativeSummary) -> Result<String> {
        self.generate(&interpretation_prompt(summary))
    }

    fn summarize(&self, records: &[StoredRecord]) -> Result<String> {
        self.generate(&summary_prompt(records))
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: &Value) -> Result<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Narrative("response has no candidates".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Narrative("response text is empty".to_string()));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AnalysisPipeline, RawInput};
    use crate::store::{JsonFileStore, RecordStore};
    use tempfile::tempdir;

    struct FixedNarrator(Option<&'static str>);

    impl Narrator for FixedNarrator {
        fn interpret(&self, _summary: &NarrativeSummary) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::Narrative("offline".into()))
        }

        fn summarize(&self, records: &[StoredRecord]) -> Result<String> {
            self.0
                .map(|s| format!("{s} ({} records)", records.len()))
                .ok_or_else(|| Error::Narrative("offline".into()))
        }
    }

    fn summary(text: &str) -> NarrativeSummary {
        let result = AnalysisPipeline::default()
            .run(&RawInput::new(text).with_filename("gene.fa"))
            .unwrap();
        NarrativeSummary::from(&result)
    }

    #[test]
    fn test_fallback_low_gc_with_orf() {
        let text = fallback_interpretation(&summary(">s\nATGAAATAA"));
        assert_eq!(
            text,
            "The analyzed sequence gene.fa contains 9 base pairs. \
             A valid ORF was detected, suggesting a potential protein-coding region."
        );
    }

    #[test]
    fn test_fallback_high_gc_without_orf() {
        let text = fallback_interpretation(&summary(">s\nGGCGCGCC"));
        assert!(text.contains("high GC content"));
        assert!(text.ends_with("suggesting a non-coding or incomplete region."));
    }

    #[test]
    fn test_interpret_or_fallback() {
        let s = summary(">s\nATGAAATAA");
        let online = FixedNarrator(Some("model text"));
        let offline = FixedNarrator(None);
        assert_eq!(interpret_or_fallback(Some(&online as &dyn Narrator), &s), "model text");
        assert_eq!(interpret_or_fallback(Some(&offline as &dyn Narrator), &s), fallback_interpretation(&s));
        assert_eq!(interpret_or_fallback(None, &s), fallback_interpretation(&s));
    }

    #[test]
    fn test_summarize_records() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let online = FixedNarrator(Some("overview"));
        let offline = FixedNarrator(None);
        assert_eq!(summarize_records(None, &[]).unwrap(), EMPTY_SUMMARY);

        let result = AnalysisPipeline::default().run(&RawInput::new(">s\nACGT")).unwrap();
        let records = vec![store.create(result, "plain".into()).unwrap()];
        assert_eq!(
            summarize_records(Some(&online as &dyn Narrator), &records).unwrap(),
            "overview (1 records)"
        );
        let err = summarize_records(Some(&offline as &dyn Narrator), &records).unwrap_err();
        assert_eq!(err.to_string(), "Narrative generation failed: Failed to generate summary");
        assert!(matches!(summarize_records(None, &records), Err(Error::Config(_))));

        let prompt = summary_prompt(&records);
        assert!(prompt.contains("- unknown.fasta: 4bp, GC=50.00%, ORF=No. plain"));
    }

    #[test]
    fn test_interpretation_prompt_lists_figures() {
        let prompt = interpretation_prompt(&summary(">s\nATGAAATAA"));
        assert!(prompt.contains("Filename: gene.fa"));
        assert!(prompt.contains("GC Content: 11.11%"));
        assert!(prompt.contains("ORF Detected: Yes"));
        assert!(prompt.contains("A=6, T=2, G=1, C=0"));
    }

    #[test]
    fn test_extract_text() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": " Hello " }, { "text": "world." }] } }]
        });
        assert_eq!(extract_text(&response).unwrap(), "Hello world.");
        assert!(extract_text(&json!({ "candidates": [] })).is_err());
        assert!(extract_text(&json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] })).is_err());
    }

    #[test]
    fn test_from_config_without_key() {
        let config = Config::default();
        assert!(GeminiNarrator::from_config(&config).unwrap().is_none());
    }
}
