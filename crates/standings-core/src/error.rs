//! Error types for the standings system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for standings operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the standings system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed match outcome or unknown league; rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Single-team lookup for a team with no record
    #[error("Not found: {0}")]
    NotFound(String),

    /// A full recalculation lost a version race against a concurrent write
    #[error("Consistency conflict: {0}")]
    Consistency(String),

    /// Standings store-related errors
    #[error("Store error: {0}")]
    Store(String),

    /// Outcome source-related errors
    #[error("Outcome source error: {0}")]
    Source(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from the underlying storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a consistency conflict error
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an outcome source error
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check whether this error is a consistency conflict (retryable)
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
