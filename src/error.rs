//! Error types for metric extraction, aggregation, and corpus access

use thiserror::Error;

/// A metric is undefined for this transcript
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("Transcript has no usable turns")]
    NoTurns,

    #[error("Zero denominator: no {0}")]
    ZeroDenominator(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("Cannot aggregate an empty population")]
    EmptyPopulation,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Corpus service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed {kind} row {index}: {reason}")]
    MalformedRow {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Unknown transcript: {0}")]
    UnknownTranscript(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
