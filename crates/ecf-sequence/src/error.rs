//! Error types for the service layer.

use ecf_sequence_store::StoreError;
use thiserror::Error;

/// Errors that can occur while running the sequence service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage error, passed through with its own message.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP server error.
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    TaskJoin(String),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
