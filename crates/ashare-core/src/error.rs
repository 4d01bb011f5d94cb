use thiserror::Error;

/// Validation and contract errors exposed by `ashare-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported period '{value}', expected one of daily, weekly, monthly")]
    UnsupportedPeriod { value: String },

    #[error("count must be a positive integer: '{value}'")]
    InvalidCount { value: String },

    #[error("field '{field}' is not numeric: '{value}'")]
    NonNumericField { field: &'static str, value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },

    #[error("invalid source '{value}', expected one of tushare, eastmoney, static")]
    InvalidSource { value: String },
}
