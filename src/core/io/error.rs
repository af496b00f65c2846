use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or validating market data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot open market history file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid timestamp '{value}' on line {line}")]
    Timestamp { line: usize, value: String },

    #[error("invalid {field} value '{value}' on line {line}")]
    Number {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("no valid data found in file")]
    Empty,

    #[error("series length mismatch: {times} timestamps, {closes} closes")]
    LengthMismatch { times: usize, closes: usize },

    #[error("timestamps must be strictly increasing (position {index})")]
    Unordered { index: usize },

    #[error("close price at position {index} must be finite and positive, got {value}")]
    InvalidClose { index: usize, value: f64 },
}
