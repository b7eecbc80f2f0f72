use thiserror::Error;

/// Errors raised while reading typed values out of a dataset.
///
/// Dashboard tasks inspect these to decide whether a section degrades to a
/// notice (missing column, nothing to aggregate) or the whole run fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("No rows left to aggregate")]
    Empty,

    #[error("Failed to parse '{value}' as number in column '{column}' at row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Unsupported input format '{0}' (expected csv, json, xlsx, xlsm, xls or ods)")]
    UnsupportedFormat(String),
}

impl DatasetError {
    /// True for the conditions a dashboard section reports instead of failing on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DatasetError::MissingColumn(_) | DatasetError::Empty)
    }
}
