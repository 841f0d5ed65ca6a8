//! Shared fixtures for the integration tests.

use std::path::{Path, PathBuf};

use securekv_core::config::{BackendKind, Config, ConfigBuilder};
use tempfile::TempDir;

/// A config pointing a file vault into a fresh temporary directory.
pub struct FileFixture {
    pub dir: TempDir,
}

impl FileFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("vault.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("securekv.json5")
    }

    pub fn config(&self) -> Config {
        ConfigBuilder::new()
            .backend(BackendKind::File)
            .store_path(self.store_path())
            .build()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for FileFixture {
    fn default() -> Self {
        Self::new()
    }
}
