//! Password envelope around an opaque byte payload.
//!
//! Layout (integers little-endian):
//!
//! ```text
//! magic    "AENV"          4
//! version  0x01            1
//! m_cost   u32 (KiB)       4
//! t_cost   u32             4
//! p_cost   u32             4
//! salt                    16
//! nonce                   12
//! ciphertext + tag         N + 16
//! ```
//!
//! The 45-byte header is the AEAD associated data, so any edit to the KDF
//! parameters, salt or nonce fails authentication like a wrong password.

use crate::cipher::{self, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, KdfParams, Salt, SALT_SIZE};

/// Leading bytes of every sealed payload. Never begins with the ZIP `PK`.
pub const ENVELOPE_MAGIC: [u8; 4] = *b"AENV";

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Length of the authenticated header preceding the ciphertext.
pub const ENVELOPE_HEADER_LEN: usize = 4 + 1 + 4 * 3 + SALT_SIZE + NONCE_SIZE;

const PARAMS_OFFSET: usize = 5;
const SALT_OFFSET: usize = PARAMS_OFFSET + 12;
const NONCE_OFFSET: usize = SALT_OFFSET + SALT_SIZE;

/// True when `bytes` starts with the envelope magic.
pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.starts_with(&ENVELOPE_MAGIC)
}

/// Encrypts `plaintext` under `password`, returning the envelope bytes.
pub fn seal(plaintext: &[u8], password: &str, params: &KdfParams) -> CryptoResult<Vec<u8>> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }

    let salt = Salt::random();
    let key = derive_key(password, &salt, params)?;
    let nonce = cipher::generate_nonce();
    let header = encode_header(params, &salt, &nonce);

    let ciphertext = cipher::encrypt(&key, &nonce, plaintext, &header)?;

    let mut out = Vec::with_capacity(header.len() + ciphertext.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts an envelope produced by [`seal`].
///
/// Structural problems (missing magic, truncation, unknown version,
/// out-of-range KDF parameters) are [`CryptoError::InvalidEnvelope`];
/// a wrong password or any tampering is [`CryptoError::Decryption`].
pub fn open(envelope: &[u8], password: &str) -> CryptoResult<Vec<u8>> {
    let header = decode_header(envelope)?;

    if password.is_empty() {
        return Err(CryptoError::Decryption("empty password".to_string()));
    }

    let key = derive_key(password, &header.salt, &header.params)?;
    cipher::decrypt(
        &key,
        &header.nonce,
        &envelope[ENVELOPE_HEADER_LEN..],
        &envelope[..ENVELOPE_HEADER_LEN],
    )
}

struct Header {
    params: KdfParams,
    salt: Salt,
    nonce: [u8; NONCE_SIZE],
}

fn encode_header(params: &KdfParams, salt: &Salt, nonce: &[u8; NONCE_SIZE]) -> Vec<u8> {
    let mut header = Vec::with_capacity(ENVELOPE_HEADER_LEN);
    header.extend_from_slice(&ENVELOPE_MAGIC);
    header.push(ENVELOPE_VERSION);
    header.extend_from_slice(&params.memory_cost.to_le_bytes());
    header.extend_from_slice(&params.time_cost.to_le_bytes());
    header.extend_from_slice(&params.parallelism.to_le_bytes());
    header.extend_from_slice(salt.as_bytes());
    header.extend_from_slice(nonce);
    header
}

fn decode_header(bytes: &[u8]) -> CryptoResult<Header> {
    if !is_sealed(bytes) {
        return Err(CryptoError::InvalidEnvelope("missing envelope magic".to_string()));
    }
    if bytes.len() < ENVELOPE_HEADER_LEN + TAG_SIZE {
        return Err(CryptoError::InvalidEnvelope(format!(
            "truncated envelope ({} bytes)",
            bytes.len()
        )));
    }
    if bytes[4] != ENVELOPE_VERSION {
        return Err(CryptoError::InvalidEnvelope(format!(
            "unsupported envelope version {}",
            bytes[4]
        )));
    }

    let params = KdfParams {
        memory_cost: read_u32(bytes, PARAMS_OFFSET),
        time_cost: read_u32(bytes, PARAMS_OFFSET + 4),
        parallelism: read_u32(bytes, PARAMS_OFFSET + 8),
    };
    params
        .validate()
        .map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))?;

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&bytes[SALT_OFFSET..SALT_OFFSET + SALT_SIZE]);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&bytes[NONCE_OFFSET..NONCE_OFFSET + NONCE_SIZE]);

    Ok(Header {
        params,
        salt: Salt::from_bytes(salt),
        nonce,
    })
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}
