//! Archive settings, loadable from TOML.
//!
//! ```toml
//! compression_level = 6
//!
//! [kdf]
//! memory_cost_kib = 19456
//! time_cost = 2
//! parallelism = 1
//! ```

use crate::error::{ArchiveError, ArchiveResult};
use annot_crypto::KdfParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Argon2id settings used when sealing. Opening always uses the values
/// recorded in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfSettings {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for KdfSettings {
    fn default() -> Self {
        KdfParams::default().into()
    }
}

impl From<KdfParams> for KdfSettings {
    fn from(params: KdfParams) -> Self {
        Self {
            memory_cost_kib: params.memory_cost,
            time_cost: params.time_cost,
            parallelism: params.parallelism,
        }
    }
}

impl KdfSettings {
    pub fn params(&self) -> KdfParams {
        KdfParams {
            memory_cost: self.memory_cost_kib,
            time_cost: self.time_cost,
            parallelism: self.parallelism,
        }
    }
}

/// Settings shared by export and import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub kdf: KdfSettings,
    /// Deflate level 0 to 9; unset uses the library default.
    pub compression_level: Option<i64>,
}

impl ArchiveConfig {
    pub fn from_toml_str(input: &str) -> ArchiveResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| ArchiveError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file.
    pub fn load(path: &Path) -> ArchiveResult<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> ArchiveResult<()> {
        self.kdf
            .params()
            .validate()
            .map_err(|e| ArchiveError::Config(e.to_string()))?;
        match self.compression_level {
            Some(level) if !(0..=9).contains(&level) => Err(ArchiveError::Config(format!(
                "compression_level {level} outside 0..=9"
            ))),
            _ => Ok(()),
        }
    }
}
