//! Error types for blob storage.

use annot_types::{BlobVariant, StorageId};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob stored under the key.
    #[error("blob not found: {storage_id} ({variant})")]
    NotFound {
        storage_id: StorageId,
        variant: BlobVariant,
    },

    /// The key cannot be mapped onto this backend.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// Stored bytes no longer match their recorded hash.
    #[error("corrupt blob: {0}")]
    Corrupt(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error from DuckDB.
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Backend-specific failure without a richer type.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(storage_id: &StorageId, variant: BlobVariant) -> Self {
        Self::NotFound {
            storage_id: storage_id.clone(),
            variant,
        }
    }

    /// Whether this is the expected "nothing stored here" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
