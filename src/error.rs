//! Error types for spa-cleanup.

use thiserror::Error;

/// Clean-up memory error types.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// A requested symbol is not in the vocabulary
    #[error("Unknown symbol: {name}")]
    UnknownSymbol { name: String },

    /// Vector lengths disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Symbol already present in the vocabulary
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// Malformed symbol expression
    #[error("Parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    /// Operation outside what this crate implements (e.g. binding)
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Configuration failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Network node or buffer lookup failed
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for clean-up operations.
pub type Result<T> = std::result::Result<T, CleanupError>;
