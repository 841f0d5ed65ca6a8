//! Configuration schema definitions.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main SecureKV configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Vault backend selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Entry attributes applied when a caller does not supply them.
    #[serde(default)]
    pub defaults: EntryDefaults,

    /// User-authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which vault implementation to open.
    #[serde(default)]
    pub backend: BackendKind,

    /// Location of the file-backed vault. Ignored by other backends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Vault backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The OS keychain where one exists, the file vault otherwise.
    #[default]
    Auto,
    /// Process-local, nothing persisted.
    Memory,
    /// Encrypted JSON document on disk.
    File,
    /// Apple Security framework keychain.
    Keychain,
}

impl BackendKind {
    /// Lowercase name as used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Memory => "memory",
            Self::File => "file",
            Self::Keychain => "keychain",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Default entry attributes.
///
/// Policy tokens are kept as raw strings here; the storage engine parses
/// them leniently at the call boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDefaults {
    /// Accessibility token (e.g. `first_unlock`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,

    /// Access-control token (e.g. `biometry_any`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control: Option<String>,

    /// Keychain access group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Service / account namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,

    /// Store new entries in the synchronizable partition.
    #[serde(default)]
    pub synchronizable: bool,
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Text shown by the OS when a read needs user authentication.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
        }
    }
}

fn default_prompt() -> String {
    "Authenticate to access your credentials".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "securekv=info".to_string()
}
