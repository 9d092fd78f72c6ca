//! Error types for KorvoDB.

use thiserror::Error;

/// Result type alias using KorvoError.
pub type Result<T> = std::result::Result<T, KorvoError>;

/// Errors that can occur in KorvoDB operations.
#[derive(Debug, Error)]
pub enum KorvoError {
    // Index errors
    #[error("Arena exhausted: requested {requested} bytes, capacity {capacity}")]
    ArenaExhausted { requested: usize, capacity: usize },

    // Configuration errors
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
