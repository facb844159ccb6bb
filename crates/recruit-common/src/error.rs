//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, RecruitError>;

/// Main error type for shared recruitment types
#[derive(Error, Debug)]
pub enum RecruitError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Invalid application aggregate: {0}")]
    InvalidAggregate(String),
}
