//! Configuration loading and persistence.

use super::{BackendKind, Config};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

impl Config {
    /// Resolve the config file path: `SECUREKV_CONFIG` first, then the default.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        match env::get_var(env::vars::CONFIG) {
            Some(path) => Ok(paths::expand_tilde(&path)),
            None => paths::config_file(),
        }
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded configuration");
        Self::parse(&content)
    }

    /// Load from `path`, or the default location when `None`, falling back to
    /// defaults when the file does not exist. Parse errors are reported.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let result = match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        };

        let mut config = match result {
            Ok(config) => config,
            Err(ConfigError::NotFound(path)) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Honor environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(backend) = env::get_var(env::vars::BACKEND) {
            self.storage.backend = backend.parse()?;
        }
        Ok(())
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolved location of the file-backed vault.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.path {
            Some(path) => Ok(paths::expand_tilde(&path.to_string_lossy())),
            None => paths::store_file(),
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        // 1. Cloud-synchronized entries cannot carry hardware-gated access control
        if self.defaults.synchronizable && self.defaults.access_control.is_some() {
            errors.push(
                "defaults.synchronizable cannot be combined with defaults.access_control"
                    .to_string(),
            );
        }

        // 2. Identity attributes must not be blank when set
        for (name, value) in [
            ("defaults.group_id", &self.defaults.group_id),
            ("defaults.account_name", &self.defaults.account_name),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.push(format!("{name} must not be empty when set"));
            }
        }

        // 3. The keychain backend only exists on Apple platforms
        if self.storage.backend == BackendKind::Keychain && !cfg!(target_vendor = "apple") {
            errors.push("storage.backend 'keychain' is only available on Apple platforms".to_string());
        }

        // 4. A path only means something to the file backend
        if self.storage.path.is_some()
            && matches!(self.storage.backend, BackendKind::Memory | BackendKind::Keychain)
        {
            errors.push(format!(
                "storage.path is set but backend '{}' does not use it",
                self.storage.backend
            ));
        }

        if self.auth.prompt.trim().is_empty() {
            errors.push("auth.prompt must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage backend.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.storage.backend = backend;
        self
    }

    /// Set the file vault location.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.path = Some(path.into());
        self
    }

    /// Set the default accessibility token.
    pub fn accessibility(mut self, token: impl Into<String>) -> Self {
        self.config.defaults.accessibility = Some(token.into());
        self
    }

    /// Set the default access-control token.
    pub fn access_control(mut self, token: impl Into<String>) -> Self {
        self.config.defaults.access_control = Some(token.into());
        self
    }

    /// Set the default access group.
    pub fn group_id(mut self, group: impl Into<String>) -> Self {
        self.config.defaults.group_id = Some(group.into());
        self
    }

    /// Set the default account name.
    pub fn account_name(mut self, account: impl Into<String>) -> Self {
        self.config.defaults.account_name = Some(account.into());
        self
    }

    /// Store new entries in the synchronizable partition by default.
    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.config.defaults.synchronizable = synchronizable;
        self
    }

    /// Set the authentication prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.auth.prompt = prompt.into();
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let content = r#"{
            // comments are fine in JSON5
            storage: { backend: "file", path: "/tmp/vault.json" },
            defaults: { accessibility: "first_unlock" },
        }"#;

        let config = Config::parse(content).unwrap();
        assert_eq!(config.storage.backend, BackendKind::File);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/vault.json")));
        assert_eq!(config.defaults.accessibility.as_deref(), Some("first_unlock"));
        assert_eq!(config.logging.filter, "securekv=info");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Config::parse("not valid"),
            Err(ConfigError::Json5(_))
        ));
        assert!(Config::parse(r#"{ storage: { backend: "floppy" } }"#).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .backend(BackendKind::Memory)
            .group_id("team.shared")
            .account_name("app")
            .accessibility("unlocked_this_device")
            .build();

        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.defaults.group_id.as_deref(), Some("team.shared"));
        assert_eq!(config.defaults.account_name.as_deref(), Some("app"));
        assert_eq!(
            config.defaults.accessibility.as_deref(),
            Some("unlocked_this_device")
        );
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_sync_with_access_control() {
        let result = ConfigBuilder::new()
            .synchronizable(true)
            .access_control("biometry_any")
            .build_validated();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("synchronizable"), "unexpected: {err_msg}");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = ConfigBuilder::new()
            .backend(BackendKind::Memory)
            .store_path("/tmp/unused.json")
            .group_id("  ")
            .prompt("")
            .build();

        let err_msg = config.validate().unwrap_err().to_string();
        assert!(err_msg.contains("storage.path"), "unexpected: {err_msg}");
        assert!(err_msg.contains("defaults.group_id"), "unexpected: {err_msg}");
        assert!(err_msg.contains("auth.prompt"), "unexpected: {err_msg}");
    }

    #[test]
    fn test_validate_keychain_backend() {
        let config = ConfigBuilder::new().backend(BackendKind::Keychain).build();
        assert_eq!(config.validate().is_ok(), cfg!(target_vendor = "apple"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("securekv.json5");

        let config = ConfigBuilder::new()
            .backend(BackendKind::File)
            .account_name("svc")
            .build();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.storage.backend, BackendKind::File);
        assert_eq!(loaded.defaults.account_name.as_deref(), Some("svc"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/securekv.json5"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json5");

        let config = Config::load_or_default(Some(&path)).unwrap();
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_load_or_default_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json5");
        fs::write(&path, "{ storage: ").unwrap();

        assert!(Config::load_or_default(Some(&path)).is_err());
    }

    #[test]
    fn test_store_path_expands_tilde() {
        let config = ConfigBuilder::new().store_path("~/vault.json").build();
        let path = config.store_path().unwrap();
        assert!(!path.to_string_lossy().contains('~'));
        assert!(path.ends_with("vault.json"));
    }
}
