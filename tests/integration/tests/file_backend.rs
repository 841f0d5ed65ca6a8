//! End-to-end tests of the engine over the encrypted file vault.

use securekv_integration_tests::FileFixture;
use securekv_storage::{
    DeleteOptions, Dispatcher, ListOptions, ReadOptions, Request, Scope, SecureStorage, Status,
    WriteOptions,
};
use serde_json::json;

#[test]
fn test_entries_survive_reopen() {
    let fixture = FileFixture::new();
    let scope = Scope::default();

    {
        let storage = SecureStorage::from_config(&fixture.config()).unwrap();
        let written = storage.write(
            "token",
            "abc123",
            &scope,
            &WriteOptions::default().accessibility("first_unlock"),
        );
        assert!(written.is_success());
    }

    let storage = SecureStorage::from_config(&fixture.config()).unwrap();
    let read = storage.read("token", &scope, &ReadOptions::default());
    assert_eq!(read.text().unwrap(), "abc123");
}

#[test]
fn test_overwrite_changes_policy() {
    let fixture = FileFixture::new();
    let storage = SecureStorage::from_config(&fixture.config()).unwrap();
    let scope = Scope::default();

    storage.write(
        "k",
        "v1",
        &scope,
        &WriteOptions::default().access_control("biometry_any"),
    );
    storage.write(
        "k",
        "v2",
        &scope,
        &WriteOptions::default().accessibility("first_unlock"),
    );

    let raw = std::fs::read_to_string(fixture.store_path()).unwrap();
    let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let items = document["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].get("access_control").is_none());
    assert_eq!(items[0]["protection"], json!("after_first_unlock"));

    let read = storage.read("k", &scope, &ReadOptions::default());
    assert_eq!(read.text().unwrap(), "v2");
}

#[test]
fn test_partitions_are_separate_identities() {
    let fixture = FileFixture::new();
    let storage = SecureStorage::from_config(&fixture.config()).unwrap();
    let scope = Scope::default();

    storage.write("k", "local", &scope, &WriteOptions::default().synchronizable(false));
    storage.write("k", "synced", &scope, &WriteOptions::default().synchronizable(true));

    let local = storage.read("k", &scope, &ReadOptions::default());
    let synced = storage.read("k", &scope, &ReadOptions::default().synchronizable(true));
    assert_eq!(local.text().unwrap(), "local");
    assert_eq!(synced.text().unwrap(), "synced");

    // deleting the local entry leaves the synchronizable one in place
    storage.delete("k", &scope, &DeleteOptions::default());
    assert_eq!(storage.contains_key("k", &scope).flag(), Some(true));

    storage.delete_all(&scope, &DeleteOptions::default().synchronizable(true));
    assert_eq!(storage.contains_key("k", &scope).flag(), Some(false));
}

#[test]
fn test_scopes_isolate_entries() {
    let fixture = FileFixture::new();
    let storage = SecureStorage::from_config(&fixture.config()).unwrap();
    let alpha = Scope::new(Some("group.alpha".to_string()), None);
    let beta = Scope::new(Some("group.beta".to_string()), None);

    storage.write("k", "a", &alpha, &WriteOptions::default());
    storage.write("k", "b", &beta, &WriteOptions::default());

    assert!(storage.delete_all(&alpha, &DeleteOptions::default()).is_success());
    assert!(storage
        .read_all(&alpha, &ListOptions::default())
        .map()
        .unwrap()
        .is_empty());
    assert_eq!(
        storage.read("k", &beta, &ReadOptions::default()).text().unwrap(),
        "b"
    );
}

#[test]
fn test_dispatcher_over_file_vault() {
    let fixture = FileFixture::new();
    let dispatcher = Dispatcher::from_config(&fixture.config()).unwrap();

    let send = |method: &str, arguments: serde_json::Value| {
        serde_json::to_value(dispatcher.handle(&Request::new(method).with_arguments(arguments)))
            .unwrap()
    };

    assert_eq!(
        send("write", json!({"key": "k1", "value": "v1", "groupId": "g"}))["status"],
        json!(0)
    );
    assert_eq!(
        send("write", json!({"key": "k2", "value": "v2", "groupId": "g"}))["status"],
        json!(0)
    );
    assert_eq!(
        send("readAll", json!({"groupId": "g"})),
        json!({"status": 0, "value": {"k1": "v1", "k2": "v2"}})
    );
    assert_eq!(
        send("write", json!({"key": "k3", "groupId": "g"}))["status"],
        json!(Status::PARAM.code())
    );
    assert_eq!(send("deleteAll", json!({"groupId": "g"}))["status"], json!(0));
    assert_eq!(
        send("readAll", json!({"groupId": "g"})),
        json!({"status": 0, "value": {}})
    );
}
