//! Encryption layer for annotation archives.
//!
//! An archive container can be wrapped in a password envelope:
//! - Key: derived from the password with Argon2id (parameters stored in
//!   the envelope header so older archives stay readable)
//! - Cipher: ChaCha20-Poly1305, with the whole header authenticated as
//!   associated data
//!
//! The envelope starts with its own magic so readers can tell a sealed
//! archive from a plain ZIP container without attempting decryption.

mod cipher;
mod envelope;
mod error;
mod key;

pub use cipher::{decrypt, encrypt, generate_nonce, NONCE_SIZE, TAG_SIZE};
pub use envelope::{is_sealed, open, seal, ENVELOPE_HEADER_LEN, ENVELOPE_MAGIC, ENVELOPE_VERSION};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
