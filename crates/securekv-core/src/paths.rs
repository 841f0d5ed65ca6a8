//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the SecureKV base directory (~/.securekv).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".securekv"))
}

/// Get the main config file path (~/.securekv/securekv.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("securekv.json5"))
}

/// Get the default file-backed vault path (~/.securekv/vault.json).
pub fn store_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("vault.json"))
}

/// Get the master key file that sits next to a file-backed vault.
pub fn key_file_for(store: &Path) -> PathBuf {
    store.with_extension("key")
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
