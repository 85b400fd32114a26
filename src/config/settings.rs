use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{DEFAULT_ITERATIONS, MIN_ITERATIONS};
use crate::errors::{CredVaultError, Result};
use crate::vault::format::write_atomic;

/// Per-vault configuration, stored as a TOML sidecar next to the vault
/// (`vault.cvault` → `vault.toml`).
///
/// Every field has a sensible default so a vault works without any
/// config file at all.  Settings are never encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// PBKDF2 iterations used when a key is (re)derived (default: 100 000).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Idle seconds before the host should lock the vault; 0 disables.
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,

    /// Seconds before a copied secret is cleared; 0 leaves it in place.
    #[serde(default = "default_clipboard_clear_secs")]
    pub clipboard_clear_secs: u64,

    /// Days a soft-deleted entry stays in the trash (default: 30).
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_auto_lock_secs() -> u64 {
    300
}

fn default_clipboard_clear_secs() -> u64 {
    30
}

fn default_retention_days() -> u32 {
    30
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            kdf_iterations: default_kdf_iterations(),
            auto_lock_secs: default_auto_lock_secs(),
            clipboard_clear_secs: default_clipboard_clear_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl VaultSettings {
    /// Load settings from `path`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed or holds invalid values,
    /// an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        let settings: VaultSettings = toml::from_str(&contents).map_err(|e| {
            CredVaultError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Write the settings to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CredVaultError::Config(format!("Failed to serialize settings: {e}")))?;
        write_atomic(path, contents.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_ITERATIONS {
            return Err(CredVaultError::Config(format!(
                "kdf_iterations must be at least {MIN_ITERATIONS}, got {}",
                self.kdf_iterations
            )));
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
