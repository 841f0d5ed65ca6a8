//! Environment variable handling.

use std::env;

/// Well-known environment variable names.
pub mod vars {
    /// Overrides the config file location.
    pub const CONFIG: &str = "SECUREKV_CONFIG";
    /// Hex-encoded 32-byte master key for the file-backed vault.
    pub const MASTER_KEY: &str = "SECUREKV_MASTER_KEY";
    /// Overrides the configured storage backend.
    pub const BACKEND: &str = "SECUREKV_BACKEND";
}

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
