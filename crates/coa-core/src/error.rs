//! Error types for COA records

use thiserror::Error;

/// Core error type for COA record handling
#[derive(Error, Debug)]
pub enum CoaError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for COA operations
pub type Result<T> = std::result::Result<T, CoaError>;
