//! Error types for the ECF Sequence Core.

use thiserror::Error;

/// Errors raised while validating caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid channel: {0:?} (expected A or B)")]
    InvalidChannel(String),

    #[error("invalid type code: {0:?}")]
    InvalidTypeCode(String),

    #[error("malformed sequence: {0:?}")]
    MalformedSequence(String),
}
