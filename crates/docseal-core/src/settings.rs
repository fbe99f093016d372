use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SealError};

pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;
pub const DEFAULT_RSA_KEY_BITS: usize = 2048;

/// Lower bound accepted by [`SealSettings::validate`].
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// Tunables for a [`crate::SealEngine`].
///
/// `kdf_iterations` is not recorded inside the envelope, so every engine that
/// opens a given blob must use the value it was sealed with. `rsa_key_bits`
/// is fixed at 2048 by the signature format and is only accepted at that value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SealSettings {
    pub kdf_iterations: u32,
    pub rsa_key_bits: usize,
}

impl Default for SealSettings {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            rsa_key_bits: DEFAULT_RSA_KEY_BITS,
        }
    }
}

impl SealSettings {
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(SealError::InvalidSettings(format!(
                "kdf_iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
                self.kdf_iterations
            )));
        }
        if self.rsa_key_bits != DEFAULT_RSA_KEY_BITS {
            return Err(SealError::InvalidSettings(format!(
                "rsa_key_bits must be {DEFAULT_RSA_KEY_BITS}, got {}",
                self.rsa_key_bits
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: SealSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SealError::Settings(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_json_str(&data)
    }
}
