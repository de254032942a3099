//! Codon tallies over the forward reading frames.
//!
//! [`count`] superimposes frames 0, 1 and 2 into one table, which is a
//! descriptive statistic and not the codon usage of any single frame. Use
//! [`count_frame`] for one frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sequence::orf::FRAMES;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

fn base_index(b: u8) -> Option<usize> {
    BASES.iter().position(|&base| base == b)
}

/// Index of a codon in `[0, 64)`, or `None` if it is not a clean triple.
fn codon_index(codon: &[u8]) -> Option<usize> {
    match codon {
        &[b1, b2, b3] => Some(base_index(b1)? * 16 + base_index(b2)? * 4 + base_index(b3)?),
        _ => None,
    }
}

fn index_to_codon(idx: usize) -> String {
    [BASES[idx >> 4], BASES[(idx >> 2) & 3], BASES[idx & 3]]
        .iter()
        .map(|&b| b as char)
        .collect()
}

/// Dense tally of the 64 codons for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameTally([usize; 64]);

impl FrameTally {
    fn of(dna: &[u8], frame: usize) -> Self {
        let tally = dna
            .get(frame..)
            .unwrap_or_default()
            .chunks_exact(3)
            .filter_map(codon_index)
            .fold([0usize; 64], |mut tally, idx| {
                tally[idx] += 1;
                tally
            });
        FrameTally(tally)
    }

    fn merge(self, other: FrameTally) -> Self {
        let mut merged = self.0;
        for (slot, n) in merged.iter_mut().zip(other.0) {
            *slot += n;
        }
        FrameTally(merged)
    }
}

impl From<FrameTally> for CodonFrequency {
    fn from(tally: FrameTally) -> Self {
        let counts = tally
            .0
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(idx, &n)| (index_to_codon(idx), n))
            .collect();
        CodonFrequency(counts)
    }
}

/// Codon to occurrence count, ordered by codon. Codons never seen are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodonFrequency(BTreeMap<String, usize>);

impl CodonFrequency {
    pub fn get(&self, codon: &str) -> usize {
        self.0.get(codon).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Number of distinct codons observed.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(codon, &n)| (codon.as_str(), n))
    }

    /// Codons sorted by descending count, ties in codon order.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Number of complete codons a frame offset yields for a sequence length.
pub fn codons_in_frame(length: usize, frame: usize) -> usize {
    length.saturating_sub(frame) / 3
}

/// Codon counts of a single reading frame; trailing partial codons are skipped.
pub fn count_frame(sequence: &str, frame: usize) -> CodonFrequency {
    FrameTally::of(sequence.as_bytes(), frame).into()
}

/// Codon counts over frames 0, 1 and 2 merged into one table.
pub fn count(sequence: &str) -> CodonFrequency {
    let dna = sequence.as_bytes();
    FRAMES
        .iter()
        .map(|&frame| FrameTally::of(dna, frame))
        .fold(FrameTally([0; 64]), FrameTally::merge)
        .into()
}
