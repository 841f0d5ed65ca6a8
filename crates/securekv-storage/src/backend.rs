//! Backend selection from configuration.

use std::sync::Arc;

use securekv_core::config::{BackendKind, Config};
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::error::{Result, StorageError};
use crate::storage::SecureStorage;
use crate::vault::{FileVault, MemoryVault, Vault};

/// The backend `auto` resolves to on this platform.
pub fn resolve_backend(kind: BackendKind) -> BackendKind {
    match kind {
        BackendKind::Auto if cfg!(target_vendor = "apple") => BackendKind::Keychain,
        BackendKind::Auto => BackendKind::File,
        other => other,
    }
}

/// Open the vault selected by `config`.
pub fn open_vault(config: &Config) -> Result<Arc<dyn Vault>> {
    let backend = resolve_backend(config.storage.backend);
    debug!(%backend, "opening vault");

    match backend {
        BackendKind::Memory => Ok(Arc::new(MemoryVault::new())),
        BackendKind::File => {
            let path = config.store_path()?;
            Ok(Arc::new(FileVault::open(path)?))
        }
        BackendKind::Keychain => open_keychain(),
        BackendKind::Auto => Err(StorageError::UnsupportedBackend(backend.to_string())),
    }
}

#[cfg(target_vendor = "apple")]
fn open_keychain() -> Result<Arc<dyn Vault>> {
    Ok(Arc::new(crate::vault::KeychainVault::new()))
}

#[cfg(not(target_vendor = "apple"))]
fn open_keychain() -> Result<Arc<dyn Vault>> {
    Err(StorageError::UnsupportedBackend(
        "the keychain backend needs an Apple platform".to_string(),
    ))
}

impl SecureStorage {
    /// Open the configured vault and apply the configured prompt.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(open_vault(config)?).with_prompt(config.auth.prompt.clone()))
    }
}

impl Dispatcher {
    /// A dispatcher over the configured vault, with the configured defaults.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(SecureStorage::from_config(config)?).with_defaults(config.defaults.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ReadOptions, Scope, WriteOptions};
    use securekv_core::config::ConfigBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_auto_resolution() {
        let resolved = resolve_backend(BackendKind::Auto);
        if cfg!(target_vendor = "apple") {
            assert_eq!(resolved, BackendKind::Keychain);
        } else {
            assert_eq!(resolved, BackendKind::File);
        }
        assert_eq!(resolve_backend(BackendKind::Memory), BackendKind::Memory);
    }

    #[test]
    fn test_memory_backend() {
        let config = ConfigBuilder::new()
            .backend(BackendKind::Memory)
            .prompt("Confirm")
            .build();
        let storage = SecureStorage::from_config(&config).unwrap();
        assert_eq!(storage.prompt(), "Confirm");

        let scope = Scope::default();
        storage.write("k", "v", &scope, &WriteOptions::default());
        assert_eq!(
            storage.read("k", &scope, &ReadOptions::default()).text().unwrap(),
            "v"
        );
    }

    #[test]
    fn test_file_backend_persists() {
        let dir = TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .backend(BackendKind::File)
            .store_path(dir.path().join("vault.json"))
            .build();

        let first = SecureStorage::from_config(&config).unwrap();
        assert!(first
            .write("k", "v", &Scope::default(), &WriteOptions::default())
            .is_success());

        let second = SecureStorage::from_config(&config).unwrap();
        let read = second.read("k", &Scope::default(), &ReadOptions::default());
        assert_eq!(read.text().unwrap(), "v");
    }

    #[cfg(not(target_vendor = "apple"))]
    #[test]
    fn test_keychain_unavailable() {
        let config = ConfigBuilder::new().backend(BackendKind::Keychain).build();
        assert!(matches!(
            open_vault(&config),
            Err(StorageError::UnsupportedBackend(_))
        ));
    }
}
