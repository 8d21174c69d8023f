//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong password or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The bytes are not a well-formed envelope.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Sealing requires a non-empty password.
    #[error("password must not be empty")]
    EmptyPassword,
}
