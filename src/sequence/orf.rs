//! Longest open reading frame on the forward strand.
//!
//! A candidate starts at an in-frame `ATG` and ends with the first in-frame
//! stop codon after it, stop included. A start with no downstream stop yields
//! nothing. Every start is extended on its own, so the scan is quadratic in
//! the worst case (e.g. long runs of `ATG` without a stop); callers should
//! bound input length.

use log::trace;
use serde::{Deserialize, Serialize};

pub const START_CODON: &[u8; 3] = b"ATG";
pub const STOP_CODONS: [&[u8; 3]; 3] = [b"TAA", b"TAG", b"TGA"];

/// Forward reading frame offsets, in scan order.
pub const FRAMES: [usize; 3] = [0, 1, 2];

pub fn is_stop_codon(codon: &[u8]) -> bool {
    STOP_CODONS.iter().any(|stop| stop.as_slice() == codon)
}

/// One terminated ORF: `sequence == dna[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrfCandidate {
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub frame: usize,
}

impl OrfCandidate {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Outcome of a scan: the winning candidate, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OrfRecord", into = "OrfRecord")]
pub struct OrfResult {
    best: Option<OrfCandidate>,
}

impl OrfResult {
    pub fn not_detected() -> Self {
        Self { best: None }
    }

    pub fn detected(&self) -> bool {
        self.best.is_some()
    }

    pub fn candidate(&self) -> Option<&OrfCandidate> {
        self.best.as_ref()
    }

    pub fn sequence(&self) -> Option<&str> {
        self.best.as_ref().map(|c| c.sequence.as_str())
    }

    pub fn start_index(&self) -> Option<usize> {
        self.best.as_ref().map(|c| c.start)
    }

    pub fn end_index_exclusive(&self) -> Option<usize> {
        self.best.as_ref().map(|c| c.end)
    }

    pub fn frame(&self) -> Option<usize> {
        self.best.as_ref().map(|c| c.frame)
    }
}

impl From<OrfCandidate> for OrfResult {
    fn from(candidate: OrfCandidate) -> Self {
        Self { best: Some(candidate) }
    }
}

/// Flat wire shape: `detected` plus nullable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrfRecord {
    detected: bool,
    sequence: Option<String>,
    start_index: Option<usize>,
    end_index_exclusive: Option<usize>,
    frame: Option<usize>,
}

impl From<OrfResult> for OrfRecord {
    fn from(result: OrfResult) -> Self {
        match result.best {
            Some(c) => OrfRecord {
                detected: true,
                sequence: Some(c.sequence),
                start_index: Some(c.start),
                end_index_exclusive: Some(c.end),
                frame: Some(c.frame),
            },
            None => OrfRecord {
                detected: false,
                sequence: None,
                start_index: None,
                end_index_exclusive: None,
                frame: None,
            },
        }
    }
}

impl From<OrfRecord> for OrfResult {
    fn from(record: OrfRecord) -> Self {
        let best = match record {
            OrfRecord {
                detected: true,
                sequence: Some(sequence),
                start_index: Some(start),
                end_index_exclusive: Some(end),
                frame: Some(frame),
            } => Some(OrfCandidate { sequence, start, end, frame }),
            _ => None,
        };
        Self { best }
    }
}

/// Position of the first in-frame stop codon at or after `from`, if any.
fn next_stop(dna: &[u8], from: usize) -> Option<usize> {
    (from..)
        .step_by(3)
        .take_while(|&j| j + 3 <= dna.len())
        .find(|&j| is_stop_codon(&dna[j..j + 3]))
}

/// Terminated candidates of one frame, in start order.
fn frame_candidates(dna: &[u8], frame: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    (frame..)
        .step_by(3)
        .take_while(move |&i| i + 3 <= dna.len())
        .filter(move |&i| &dna[i..i + 3] == START_CODON)
        .filter_map(move |i| next_stop(dna, i + 3).map(|stop| (i, stop + 3)))
}

/// Every terminated candidate, frame 0 first, then by start position.
pub fn candidates(sequence: &str) -> Vec<OrfCandidate> {
    let dna = sequence.as_bytes();
    FRAMES
        .iter()
        .flat_map(move |&frame| {
            frame_candidates(dna, frame).map(move |(start, end)| OrfCandidate {
                sequence: sequence[start..end].to_string(),
                start,
                end,
                frame,
            })
        })
        .collect()
}

/// Finds the longest terminated ORF across the three forward frames.
///
/// Ties keep the first candidate seen: lower frame first, then earlier start.
pub fn scan(sequence: &str) -> OrfResult {
    let dna = sequence.as_bytes();
    let mut best: Option<(usize, usize, usize)> = None;

    for frame in FRAMES {
        for (start, end) in frame_candidates(dna, frame) {
            let longer = best.map_or(true, |(s, e, _)| end - start > e - s);
            if longer {
                trace!("New longest ORF candidate: frame {frame}, {start}..{end}");
                best = Some((start, end, frame));
            }
        }
    }

    match best {
        Some((start, end, frame)) => OrfCandidate {
            sequence: sequence[start..end].to_string(),
            start,
            end,
            frame,
        }
        .into(),
        None => OrfResult::not_detected(),
    }
}
