//! Async access to the blocking engine.
//!
//! Vault calls block, possibly for as long as a user takes to authenticate,
//! so every operation runs on the tokio blocking pool. No lock is taken
//! across calls: two writers racing on one identity can still observe the
//! missing-entry window of an overwrite.

use std::sync::Arc;

use async_trait::async_trait;
use securekv_core::SecretString;
use tracing::warn;

use crate::dispatch::{Arguments, Dispatcher, Method, Request};
use crate::options::{DeleteOptions, ListOptions, ReadOptions, Scope, WriteOptions};
use crate::response::Response;
use crate::status::Status;
use crate::storage::SecureStorage;

/// Async trait for credential stores.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Check whether an entry exists in either partition.
    async fn contains_key(&self, key: &str, scope: &Scope) -> Response;

    /// Read one entry.
    async fn read(&self, key: &str, scope: &Scope, options: &ReadOptions) -> Response;

    /// Read every entry in a scope.
    async fn read_all(&self, scope: &Scope, options: &ListOptions) -> Response;

    /// Store an entry, replacing any existing one.
    async fn write(
        &self,
        key: &str,
        value: SecretString,
        scope: &Scope,
        options: &WriteOptions,
    ) -> Response;

    /// Delete one entry.
    async fn delete(&self, key: &str, scope: &Scope, options: &DeleteOptions) -> Response;

    /// Delete every entry in a scope.
    async fn delete_all(&self, scope: &Scope, options: &DeleteOptions) -> Response;
}

/// Run a blocking engine call on the blocking pool.
async fn run_blocking<F>(f: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "storage worker failed");
            Response::status(Status::PARAM)
        }
    }
}

/// [`SecureStorage`] behind the [`CredentialStore`] trait.
#[derive(Debug, Clone)]
pub struct AsyncSecureStorage {
    storage: Arc<SecureStorage>,
}

impl AsyncSecureStorage {
    pub fn new(storage: SecureStorage) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    pub fn storage(&self) -> &SecureStorage {
        &self.storage
    }
}

#[async_trait]
impl CredentialStore for AsyncSecureStorage {
    async fn contains_key(&self, key: &str, scope: &Scope) -> Response {
        let storage = Arc::clone(&self.storage);
        let (key, scope) = (key.to_owned(), scope.clone());
        run_blocking(move || storage.contains_key(&key, &scope)).await
    }

    async fn read(&self, key: &str, scope: &Scope, options: &ReadOptions) -> Response {
        let storage = Arc::clone(&self.storage);
        let (key, scope, options) = (key.to_owned(), scope.clone(), options.clone());
        run_blocking(move || storage.read(&key, &scope, &options)).await
    }

    async fn read_all(&self, scope: &Scope, options: &ListOptions) -> Response {
        let storage = Arc::clone(&self.storage);
        let (scope, options) = (scope.clone(), options.clone());
        run_blocking(move || storage.read_all(&scope, &options)).await
    }

    async fn write(
        &self,
        key: &str,
        value: SecretString,
        scope: &Scope,
        options: &WriteOptions,
    ) -> Response {
        let storage = Arc::clone(&self.storage);
        let (key, scope, options) = (key.to_owned(), scope.clone(), options.clone());
        run_blocking(move || storage.write(&key, value.expose_secret(), &scope, &options)).await
    }

    async fn delete(&self, key: &str, scope: &Scope, options: &DeleteOptions) -> Response {
        let storage = Arc::clone(&self.storage);
        let (key, scope, options) = (key.to_owned(), scope.clone(), options.clone());
        run_blocking(move || storage.delete(&key, &scope, &options)).await
    }

    async fn delete_all(&self, scope: &Scope, options: &DeleteOptions) -> Response {
        let storage = Arc::clone(&self.storage);
        let (scope, options) = (scope.clone(), options.clone());
        run_blocking(move || storage.delete_all(&scope, &options)).await
    }
}

/// [`Dispatcher`] on the blocking pool.
#[derive(Debug, Clone)]
pub struct AsyncDispatcher {
    dispatcher: Arc<Dispatcher>,
}

impl AsyncDispatcher {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let dispatcher = Arc::clone(&self.dispatcher);
        run_blocking(move || dispatcher.handle(&request)).await
    }

    pub async fn call(&self, method: Method, arguments: Arguments) -> Response {
        let dispatcher = Arc::clone(&self.dispatcher);
        run_blocking(move || dispatcher.call(method, arguments)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryVault;
    use serde_json::json;

    fn store() -> AsyncSecureStorage {
        AsyncSecureStorage::new(SecureStorage::new(Arc::new(MemoryVault::new())))
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let store = store();
        let scope = Scope::default();

        let written = store
            .write("k", SecretString::new("v"), &scope, &WriteOptions::default())
            .await;
        assert!(written.is_success());

        let read = store.read("k", &scope, &ReadOptions::default()).await;
        assert_eq!(read.text().unwrap(), "v");
        assert_eq!(store.contains_key("k", &scope).await.flag(), Some(true));
    }

    #[tokio::test]
    async fn test_delete_all_clears_scope() {
        let store = store();
        let scope = Scope::new(None, Some("svc".to_string()));
        for key in ["a", "b", "c"] {
            store
                .write(key, SecretString::new(key), &scope, &WriteOptions::default())
                .await;
        }

        let all = store.read_all(&scope, &ListOptions::default()).await;
        assert_eq!(all.map().unwrap().len(), 3);

        assert!(store.delete("a", &scope, &DeleteOptions::default()).await.is_success());
        assert!(store.delete_all(&scope, &DeleteOptions::default()).await.is_success());
        let all = store.read_all(&scope, &ListOptions::default()).await;
        assert!(all.map().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_works_as_trait_object() {
        let store: Arc<dyn CredentialStore> = Arc::new(store());
        let scope = Scope::default();

        let response = store
            .write(
                "k",
                SecretString::new("v"),
                &scope,
                &WriteOptions::default().synchronizable(true).access_control("user_presence"),
            )
            .await;
        assert_eq!(response.status, Status::PARAM);
    }

    #[tokio::test]
    async fn test_concurrent_writers_to_distinct_keys() {
        let store = store();
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key-{i}");
                store
                    .write(&key, SecretString::new(format!("value-{i}")), &Scope::default(), &WriteOptions::default())
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }

        let all = store.read_all(&Scope::default(), &ListOptions::default()).await;
        assert_eq!(all.map().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_async_dispatcher() {
        let storage = SecureStorage::new(Arc::new(MemoryVault::new()));
        let dispatcher = AsyncDispatcher::new(Dispatcher::new(storage));

        let request = Request::new("write").with_arguments(json!({"key": "k", "value": "v"}));
        assert!(dispatcher.handle(request).await.is_success());

        let request = Request::new("read").with_arguments(json!({"key": "k"}));
        assert_eq!(dispatcher.handle(request).await.text().unwrap(), "v");

        let arguments = Arguments {
            key: Some("k".to_string()),
            ..Default::default()
        };
        let found = dispatcher.call(Method::ContainsKey, arguments).await;
        assert_eq!(found.flag(), Some(true));
    }
}
