//! Error types for dockhand utilities

use thiserror::Error;

/// Errors produced while parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration not allowed: {0:?}")]
    Negative(String),

    #[error("invalid number in duration {0:?}")]
    InvalidNumber(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration out of range: {0:?}")]
    Overflow(String),
}

pub type DurationResult<T> = std::result::Result<T, DurationParseError>;
