//! Async wrapper tests over the file vault.

use std::sync::Arc;

use securekv_core::SecretString;
use securekv_integration_tests::FileFixture;
use securekv_storage::{
    AsyncSecureStorage, CredentialStore, ListOptions, ReadOptions, Scope, SecureStorage,
    WriteOptions,
};

#[tokio::test]
async fn test_async_round_trip() {
    let fixture = FileFixture::new();
    let storage = SecureStorage::from_config(&fixture.config()).unwrap();
    let store: Arc<dyn CredentialStore> = Arc::new(AsyncSecureStorage::new(storage));
    let scope = Scope::default();

    let written = store
        .write("k", SecretString::new("välue"), &scope, &WriteOptions::default())
        .await;
    assert!(written.is_success());

    let read = store.read("k", &scope, &ReadOptions::default()).await;
    assert_eq!(read.text().unwrap(), "välue");
}

#[tokio::test]
async fn test_sequential_overwrites_keep_last_value() {
    let fixture = FileFixture::new();
    let store = AsyncSecureStorage::new(SecureStorage::from_config(&fixture.config()).unwrap());
    let scope = Scope::default();

    for i in 0..5 {
        let response = store
            .write("counter", SecretString::new(i.to_string()), &scope, &WriteOptions::default())
            .await;
        assert!(response.is_success());
    }

    let all = store.read_all(&scope, &ListOptions::default()).await;
    let entries = all.map().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["counter"], "4");
}
