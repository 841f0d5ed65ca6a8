//! Error types for vault backends.
//!
//! Engine operations never return these; they report a [`Status`]. Backends
//! use [`StorageError`] internally and translate it at the vault boundary.

use crate::status::Status;
use securekv_core::ConfigError;
use thiserror::Error;

/// Errors raised while opening or operating a vault backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Master key error: {0}")]
    MasterKey(String),

    #[error("Corrupted vault file: {0}")]
    Corrupted(String),

    #[error("Backend not available on this platform: {0}")]
    UnsupportedBackend(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// The status reported to callers when this error surfaces from a vault call.
    pub fn status(&self) -> Status {
        match self {
            Self::Io(_) => Status::IO,
            Self::DecryptionFailed(_) | Self::Corrupted(_) | Self::Json(_) => Status::DECODE,
            _ => Status::PARAM,
        }
    }
}

/// Convenience result alias for backend operations.
pub type Result<T> = std::result::Result<T, StorageError>;
