use std::path::PathBuf;
use thiserror::Error;

/// Failure to get an object's bytes onto local disk.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },
    #[error("failed to fetch '{key}' from bucket '{bucket}': {source}")]
    Transport {
        bucket: String,
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to stage object at '{}': {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The fetched file is not a usable meter time series.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read staged file: {0}")]
    Io(#[source] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: expected {expected} fields, found {found}")]
    TooManyFields {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),
    #[error("row {row}: cannot parse '{value}' as a timestamp")]
    InvalidTimestamp { row: usize, value: String },
    #[error("need at least 2 rows to infer the sampling interval, got {0}")]
    TooFewRows(usize),
    #[error("table has no numeric columns")]
    NoNumericColumns,
}

/// Errors returned by [`crate::summarizer::TimeSeriesSummarizer::summarize`].
///
/// Only `NotFound` is recovered by the handler; every `Table` error is fatal.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("file cannot be found: {0}")]
    NotFound(#[source] FetchError),
    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<FetchError> for SummaryError {
    fn from(err: FetchError) -> Self {
        SummaryError::NotFound(err)
    }
}
