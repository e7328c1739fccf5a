use thiserror::Error;

/// Validation and contract errors exposed by `tickerwatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker symbol cannot be empty")]
    EmptySymbol,

    #[error("history window of {value} {unit} is outside {min}..={max}")]
    WindowOutOfRange {
        unit: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("refresh interval of {value}s is outside {min}..={max}")]
    RefreshIntervalOutOfRange { value: u64, min: u64, max: u64 },

    #[error("field '{field}' must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },
}
