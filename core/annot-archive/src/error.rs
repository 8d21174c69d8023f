//! Error types for archive export and import.

use crate::layout::ArchiveKind;
use annot_crypto::CryptoError;
use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Structural failures that abort an export or import.
///
/// Per-blob problems never appear here; they are logged and listed in the
/// operation's report.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The bytes are neither a container nor a sealed archive, or the
    /// container cannot be read.
    #[error("not a valid archive: {0}")]
    Format(String),

    /// The archive is sealed and no password was supplied.
    #[error("archive is password protected")]
    PasswordRequired,

    /// Wrong password, or a sealed payload that is damaged or tampered with.
    #[error("wrong password or corrupted archive: {0}")]
    Decryption(String),

    /// The container parsed but lacks or mangles required metadata.
    #[error("invalid {kind} archive: {reason}")]
    Schema { kind: ArchiveKind, reason: String },

    /// The same path was added to a container twice.
    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// An entry path is empty, absolute or escapes the container root.
    #[error("invalid archive path: {0:?}")]
    InvalidPath(String),

    /// The identifier allocator cannot hand out another id.
    #[error("identifier allocation failed: {0}")]
    IdentifierExhaustion(String),

    /// Sealing the container failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ArchiveError {
    pub(crate) fn schema(kind: ArchiveKind, reason: impl Into<String>) -> Self {
        Self::Schema {
            kind,
            reason: reason.into(),
        }
    }

    /// The caller should ask for a (different) password and retry.
    #[must_use]
    pub fn is_password_error(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::Decryption(_))
    }

    /// The file is not an archive of the expected kind.
    #[must_use]
    pub fn is_invalid_file(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Schema { .. })
    }
}

impl From<CryptoError> for ArchiveError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption(reason) => Self::Decryption(reason),
            // Only reached for input that already carries the envelope magic.
            CryptoError::InvalidEnvelope(reason) => Self::Decryption(reason),
            other => Self::Encryption(other.to_string()),
        }
    }
}
