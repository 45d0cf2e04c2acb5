//! Error types for the chargeback system
//!
//! Provides a unified error type and domain-specific error variants.
//! Lookup misses and malformed attributes are deliberately *not* errors:
//! the engine degrades to safe defaults and keeps going (see the individual
//! modules); only conditions that invalidate a whole report surface here.

use thiserror::Error;

/// Result type alias using ChargebackError
pub type Result<T> = std::result::Result<T, ChargebackError>;

/// Unified error type for chargeback operations
#[derive(Debug, Error)]
pub enum ChargebackError {
    // Collection errors
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Usage collection errors
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Usage query failed for {metric} in group {group}: {reason}")]
    QueryFailed {
        metric: String,
        group: String,
        reason: String,
    },
}

// Implement From for common external error types
impl From<serde_json::Error> for ChargebackError {
    fn from(err: serde_json::Error) -> Self {
        ChargebackError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ChargebackError {
    fn from(err: std::io::Error) -> Self {
        ChargebackError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for ChargebackError {
    fn from(err: anyhow::Error) -> Self {
        ChargebackError::Internal(err.to_string())
    }
}
