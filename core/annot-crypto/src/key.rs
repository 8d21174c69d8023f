//! Key derivation and management.
//!
//! Uses Argon2id for deriving encryption keys from passwords.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Size of salt in bytes.
pub const SALT_SIZE: usize = 16;

/// A derived encryption key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Salt for key derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }
}

/// Key derivation parameters.
///
/// These are written into every envelope header, so raising the defaults
/// never breaks archives sealed with older values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id (2023)
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Upper bound accepted from an envelope header (1 GiB).
    pub const MAX_MEMORY_COST: u32 = 1024 * 1024;
    /// Upper bound on iterations accepted from an envelope header.
    pub const MAX_TIME_COST: u32 = 64;
    /// Upper bound on lanes accepted from an envelope header.
    pub const MAX_PARALLELISM: u32 = 16;

    /// Checks the parameters are usable and within the accepted bounds.
    ///
    /// Headers come from untrusted files; this runs before any derivation
    /// so a crafted archive cannot request gigabytes of memory.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.parallelism == 0 || self.parallelism > Self::MAX_PARALLELISM {
            return Err(CryptoError::KeyDerivation(format!(
                "parallelism {} out of range",
                self.parallelism
            )));
        }
        if self.time_cost == 0 || self.time_cost > Self::MAX_TIME_COST {
            return Err(CryptoError::KeyDerivation(format!(
                "time cost {} out of range",
                self.time_cost
            )));
        }
        if self.memory_cost < 8 * self.parallelism || self.memory_cost > Self::MAX_MEMORY_COST {
            return Err(CryptoError::KeyDerivation(format!(
                "memory cost {} KiB out of range",
                self.memory_cost
            )));
        }
        Ok(())
    }
}

/// Derives an encryption key from a password using Argon2id.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut key_bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = DerivedKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(KdfParams::default().validate().is_ok());
    }

    #[test]
    fn oversized_memory_rejected() {
        let params = KdfParams {
            memory_cost: KdfParams::MAX_MEMORY_COST + 1,
            ..KdfParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let params = KdfParams {
            time_cost: 0,
            ..KdfParams::default()
        };
        assert!(params.validate().is_err());
    }
}
