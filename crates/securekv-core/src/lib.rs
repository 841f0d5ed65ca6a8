//! # securekv-core
//!
//! Shared functionality for the SecureKV crates:
//!
//! - **Configuration**: loading, validation, and persistence of the JSON5 config file
//! - **Paths**: resolution of the data directory, store file, and key file
//! - **Secrets**: the redacting [`SecretString`] wrapper used for stored values

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

pub use config::Config;
pub use error::{ConfigError, Result};
pub use secret::SecretString;
