//! Error types for the store module.

use ecf_sequence_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live row matches the requested type code.
    #[error("receipt type not found: {0}")]
    NotFound(String),

    /// Channel is not `A` or `B`.
    #[error("invalid channel: {0:?} (expected A or B)")]
    InvalidChannel(String),

    /// Table file could not be opened, read or saved.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table file does not have the expected layout.
    #[error("malformed table: {0}")]
    Format(String),

    /// A column the operation needs is not in the table.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Value does not fit in the fixed-width field.
    #[error("value {value:?} does not fit field {field} (width {width})")]
    FieldOverflow {
        field: String,
        width: usize,
        value: String,
    },

    /// Row index past the end of the table.
    #[error("row {0} out of range")]
    RowOutOfRange(usize),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidChannel(c) => StoreError::InvalidChannel(c),
            CoreError::InvalidTypeCode(code) => StoreError::NotFound(code),
            CoreError::MalformedSequence(s) => StoreError::Format(s),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
