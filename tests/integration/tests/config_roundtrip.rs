//! Config save/load roundtrip integration tests.

use securekv_core::config::{BackendKind, Config, ConfigBuilder};
use securekv_integration_tests::FileFixture;
use std::path::Path;

#[test]
fn test_config_save_and_load() {
    let fixture = FileFixture::new();
    let path = fixture.config_path();

    let config = ConfigBuilder::new()
        .backend(BackendKind::File)
        .store_path(fixture.store_path())
        .accessibility("first_unlock")
        .account_name("team")
        .prompt("Unlock")
        .build();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.storage.backend, BackendKind::File);
    assert_eq!(loaded.storage.path, Some(fixture.store_path()));
    assert_eq!(loaded.defaults.accessibility.as_deref(), Some("first_unlock"));
    assert_eq!(loaded.defaults.account_name.as_deref(), Some("team"));
    assert_eq!(loaded.auth.prompt, "Unlock");
}

#[test]
fn test_json5_features_accepted() {
    let config = Config::parse(
        r#"{
            // comments and unquoted keys
            storage: { backend: 'memory' },
            defaults: { synchronizable: true, },
        }"#,
    )
    .unwrap();
    assert_eq!(config.storage.backend, BackendKind::Memory);
    assert!(config.defaults.synchronizable);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let fixture = FileFixture::new();
    let config = Config::load_or_default(Some(&fixture.config_path())).unwrap();
    assert_eq!(config.auth.prompt, Config::default().auth.prompt);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/securekv.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json5").is_err());
    assert!(Config::parse("{ storage: { backend: 'floppy' } }").is_err());
}
