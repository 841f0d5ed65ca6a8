//! The storage engine.
//!
//! [`SecureStorage`] composes the policy resolver, access-control compiler,
//! query builder and existence resolver into the six entry operations. Each
//! operation is a blocking round trip to the vault and reports a
//! [`Response`]; nothing is cached between calls.
//!
//! `write` replaces an existing entry by deleting it and inserting the new
//! one. The two steps are separate vault calls, so a concurrent reader can
//! briefly see the entry as missing.

use std::collections::BTreeMap;
use std::sync::Arc;

use securekv_core::SecretString;
use tracing::{debug, warn};

use crate::access_control;
use crate::existence;
use crate::options::{selector, DeleteOptions, ListOptions, ReadOptions, Scope, WriteOptions};
use crate::policy;
use crate::query::{Attr, MatchLimit, Query, QueryBuilder, Value};
use crate::response::Response;
use crate::status::Status;
use crate::vault::Vault;

/// Prompt used when none is configured.
pub const DEFAULT_PROMPT: &str = "Authenticate to access your credentials";

/// Synchronous credential store over a [`Vault`].
#[derive(Clone)]
pub struct SecureStorage {
    vault: Arc<dyn Vault>,
    prompt: String,
}

impl std::fmt::Debug for SecureStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureStorage")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

impl SecureStorage {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self {
            vault,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    /// Set the text shown when a read needs user authentication.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn vault(&self) -> &Arc<dyn Vault> {
        &self.vault
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    fn scoped(scope: &Scope) -> QueryBuilder {
        Query::builder()
            .group_id(scope.group_id())
            .account_name(scope.account_name())
    }

    /// Whether `key` exists in either partition.
    pub fn contains_key(&self, key: &str, scope: &Scope) -> Response {
        debug!(key, group = ?scope.group_id, account = ?scope.account_name, "contains_key");
        match existence::exists(self.vault.as_ref(), key, scope) {
            Ok(found) => Response::with_bool(found),
            Err(status) => Response::status(status),
        }
    }

    /// Read the value stored under `key`.
    ///
    /// A missing entry is a success with no value.
    pub fn read(&self, key: &str, scope: &Scope, options: &ReadOptions) -> Response {
        debug!(key, group = ?scope.group_id, account = ?scope.account_name, "read");

        let mut query = Self::scoped(scope)
            .key(Some(key))
            .synchronizable(options.synchronizable)
            .return_data(Some(true))
            .build();
        if selector(&options.access_control).is_some() {
            query.insert(Attr::OperationPrompt, Value::Str(self.prompt.clone()));
        }

        let items = match self.vault.copy_matching(&query) {
            Ok(items) => items,
            Err(status) if status.is_not_found() => return Response::ok(),
            Err(status) => return Response::status(status),
        };

        let Some(data) = items.into_iter().next().and_then(|item| item.data) else {
            return Response::ok();
        };
        match SecretString::from_vault_bytes(data) {
            Some(value) => Response::with_text(value),
            None => {
                debug!(key, "stored value is not valid UTF-8");
                Response::status(Status::DECODE)
            }
        }
    }

    /// Read every entry in `scope`, keyed by entry key.
    ///
    /// Values that are not valid UTF-8 are returned as empty strings.
    pub fn read_all(&self, scope: &Scope, options: &ListOptions) -> Response {
        debug!(group = ?scope.group_id, account = ?scope.account_name, "read_all");

        let mut query = Self::scoped(scope)
            .synchronizable(options.synchronizable)
            .accessibility(options.accessibility.as_deref())
            .return_data(Some(true))
            .build();
        query.insert(Attr::ReturnAttributes, Value::Bool(true));
        query.insert(Attr::MatchLimit, Value::Limit(MatchLimit::All));

        let items = match self.vault.copy_matching(&query) {
            Ok(items) => items,
            Err(status) if status.is_not_found() => return Response::with_map(BTreeMap::new()),
            Err(status) => return Response::status(status),
        };

        let mut entries = BTreeMap::new();
        for item in items {
            let Some(key) = item.account else {
                continue;
            };
            let value = SecretString::from_vault_bytes(item.data.unwrap_or_default())
                .unwrap_or_else(|| {
                    warn!(key = %key, "stored value is not valid UTF-8, substituting empty string");
                    SecretString::default()
                });
            entries.insert(key, value);
        }
        Response::with_map(entries)
    }

    /// Store `value` under `key`, replacing any existing entry.
    pub fn write(&self, key: &str, value: &str, scope: &Scope, options: &WriteOptions) -> Response {
        debug!(
            key,
            group = ?scope.group_id,
            account = ?scope.account_name,
            synchronizable = ?options.synchronizable,
            "write"
        );
        match self.try_write(key, value, scope, options) {
            Ok(status) | Err(status) => Response::status(status),
        }
    }

    fn try_write(
        &self,
        key: &str,
        value: &str,
        scope: &Scope,
        options: &WriteOptions,
    ) -> Result<Status, Status> {
        options.validate()?;

        let existed = existence::exists(self.vault.as_ref(), key, scope)?;

        let mut query = Self::scoped(scope)
            .key(Some(key))
            .synchronizable(options.synchronizable)
            .build();
        let protection = policy::resolve_protection(options.accessibility.as_deref());
        match selector(&options.access_control) {
            Some(access_control) => {
                let compiled = access_control::compile(self.vault.as_ref(), access_control, protection)?;
                query.insert(Attr::AccessControl, Value::AccessControl(compiled));
            }
            None => {
                query.insert(Attr::Accessible, Value::Protection(protection));
            }
        }
        query.insert(Attr::ValueData, Value::Data(value.as_bytes().to_vec()));

        if existed {
            let identity = Self::scoped(scope)
                .key(Some(key))
                .synchronizable(options.synchronizable)
                .build();
            let status = self.vault.delete(&identity);
            if !status.is_success() && !status.is_not_found() {
                debug!(key, %status, "removing previous entry failed");
                return Err(status);
            }
        }

        Ok(self.vault.add(&query))
    }

    /// Delete the entry under `key`. Deleting a missing entry succeeds.
    pub fn delete(&self, key: &str, scope: &Scope, options: &DeleteOptions) -> Response {
        debug!(key, group = ?scope.group_id, account = ?scope.account_name, "delete");
        let query = Self::scoped(scope)
            .key(Some(key))
            .synchronizable(options.synchronizable)
            .build();
        Self::delete_status(self.vault.delete(&query))
    }

    /// Delete every entry in `scope`.
    pub fn delete_all(&self, scope: &Scope, options: &DeleteOptions) -> Response {
        debug!(group = ?scope.group_id, account = ?scope.account_name, "delete_all");
        let query = Self::scoped(scope)
            .synchronizable(options.synchronizable)
            .build();
        Self::delete_status(self.vault.delete(&query))
    }

    fn delete_status(status: Status) -> Response {
        if status.is_not_found() {
            Response::ok()
        } else {
            Response::status(status)
        }
    }
}
