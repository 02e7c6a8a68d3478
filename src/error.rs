use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the normalization and forecasting core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Invalid frequency: {0} seconds (must be positive)")]
    InvalidFrequency(i64),

    #[error("Empty input: no observations supplied")]
    EmptyInput,

    #[error("Unparsable timestamp: {0:?}")]
    UnparsableTimestamp(String),

    #[error("Boundary {boundary} outside series range {first:?}..={last:?}")]
    BoundaryOutOfRange {
        boundary: NaiveDateTime,
        first: Option<NaiveDateTime>,
        last: Option<NaiveDateTime>,
    },

    #[error("Insufficient history: need {required} values, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),

    #[error("Series has {count} unfilled slots, first at {first}")]
    UnfilledValues { count: usize, first: NaiveDateTime },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
