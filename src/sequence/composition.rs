use serde::{Deserialize, Serialize};

/// Per-base tallies of a nucleotide sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NucleotideCounts {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "T")]
    pub t: usize,
    #[serde(rename = "G")]
    pub g: usize,
    #[serde(rename = "C")]
    pub c: usize,
}

impl NucleotideCounts {
    pub fn total(&self) -> usize {
        self.a + self.t + self.g + self.c
    }

    pub fn gc(&self) -> usize {
        self.g + self.c
    }

    /// Count for one base letter; anything outside A/T/G/C is zero.
    pub fn get(&self, base: char) -> usize {
        match base.to_ascii_uppercase() {
            'A' => self.a,
            'T' => self.t,
            'G' => self.g,
            'C' => self.c,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub length: usize,
    pub counts: NucleotideCounts,
    pub gc_percent: f64,
}

impl CompositionResult {
    /// Share of `base` in the sequence, as a percentage.
    pub fn base_percent(&self, base: char) -> f64 {
        percent(self.counts.get(base), self.length)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}

/// Counts each base in a single pass and derives the GC percentage.
///
/// Expects the uppercase output of the FASTA parser. An empty sequence gives
/// a GC percentage of zero.
pub fn analyze(sequence: &str) -> CompositionResult {
    let counts = sequence
        .bytes()
        .fold(NucleotideCounts::default(), |mut counts, b| {
            match b.to_ascii_uppercase() {
                b'A' => counts.a += 1,
                b'T' => counts.t += 1,
                b'G' => counts.g += 1,
                b'C' => counts.c += 1,
                _ => {}
            }
            counts
        });

    CompositionResult {
        length: sequence.len(),
        counts,
        gc_percent: percent(counts.gc(), sequence.len()),
    }
}
