//! Library configuration, loaded from a `passvault.toml` file.
//!
//! Every field has a sensible default so the library works without any
//! config file at all.  The settings only tune vault *creation*; an
//! existing vault always uses the parameters stored in its own header.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{Result, VaultError};

/// Tunable knobs for new vaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_kdf_memory_kib")]
    pub kdf_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kdf_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            kdf_memory_kib: default_kdf_memory_kib(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("cannot read {}: {e}", path.display())))?;

        toml::from_str(&contents)
            .map_err(|e| VaultError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// The KDF parameters these settings describe.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.kdf_memory_kib,
            iterations: self.kdf_iterations,
            parallelism: self.kdf_parallelism,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("passvault.toml")).unwrap();
        assert_eq!(settings.kdf_memory_kib, 65_536);
        assert_eq!(settings.kdf_iterations, 3);
        assert_eq!(settings.kdf_parallelism, 4);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passvault.toml");
        fs::write(&path, "kdf_iterations = 5\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.kdf_iterations, 5);
        assert_eq!(settings.kdf_memory_kib, 65_536);
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passvault.toml");
        fs::write(&path, "kdf_iterations = \"three\"\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn kdf_params_round_trip() {
        let settings = Settings {
            kdf_memory_kib: 16_384,
            kdf_iterations: 2,
            kdf_parallelism: 1,
        };
        let params = settings.kdf_params();
        assert_eq!(params.memory_kib, 16_384);
        assert_eq!(params.iterations, 2);
        assert_eq!(params.parallelism, 1);
    }
}
