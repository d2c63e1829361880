//! Storage error types.

use thiserror::Error;

/// Errors surfaced by storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A column family was not found in the backend.
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Backend-specific failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Stored data failed to deserialize.
    #[error("Corrupt value under {cf}: {reason}")]
    Corrupt { cf: &'static str, reason: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
