//! Error types for symbio.
//!
//! The analysis core only ever fails with [`FastaError`]. Everything around it
//! (configuration, storage, the narrative client) reports through [`Error`].

use thiserror::Error;

use crate::sequence::FastaError;

#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected by the FASTA parser
    #[error(transparent)]
    Fasta(#[from] FastaError),

    /// Input larger than the configured bound
    #[error("Input too long: more than {limit} bytes")]
    InputTooLong { limit: usize },

    /// Input bytes that are not UTF-8 text
    #[error("Input is not valid text: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Sequence not found: {0}")]
    NotFound(String),

    #[error("Not allowed to delete this file: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Narrative service answered but not with usable text
    #[error("Narrative generation failed: {0}")]
    Narrative(String),

    #[error("Logger setup failed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl Error {
    /// True for errors caused by the caller's input, which they can correct.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Fasta(_) | Error::InputTooLong { .. } | Error::InvalidEncoding(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
