//! In-memory vault.
//!
//! Holds items in a process-local table with the same matching rules as the
//! native stores. It also records every call and can inject one-shot
//! failures, which is what the engine tests lean on.

use super::table::{ItemTable, StoredItem};
use super::{Item, Vault, VaultOp};
use crate::access_control::{AccessControl, AccessControlFlags};
use crate::policy::ProtectionClass;
use crate::query::{Attr, Query};
use crate::status::Status;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a user authenticates successfully.
///
/// Receives the operation prompt, if the query carried one. It may block;
/// the vault lock is not held while it runs.
pub type Authenticator = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// A recorded vault call.
#[derive(Debug, Clone)]
pub struct VaultCall {
    pub op: VaultOp,
    /// `None` for access-control construction.
    pub query: Option<Query>,
}

struct MemoryState {
    table: ItemTable,
    calls: Vec<VaultCall>,
    failures: HashMap<VaultOp, Status>,
}

/// Process-local vault. Nothing is persisted.
pub struct MemoryVault {
    state: Mutex<MemoryState>,
    authenticator: Mutex<Authenticator>,
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                table: ItemTable::default(),
                calls: Vec::new(),
                failures: HashMap::new(),
            }),
            authenticator: Mutex::new(Arc::new(|_| true)),
        }
    }

    /// Make the next call of `op` return `status` without touching the table.
    pub fn fail_next(&self, op: VaultOp, status: Status) {
        self.state.lock().failures.insert(op, status);
    }

    /// Replace the authentication outcome for access-controlled reads.
    pub fn set_authenticator(&self, authenticator: Authenticator) {
        *self.authenticator.lock() = authenticator;
    }

    /// Every subsequent authentication attempt fails.
    pub fn deny_authentication(&self) {
        self.set_authenticator(Arc::new(|_| false));
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<VaultCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of stored items across all partitions.
    pub fn len(&self) -> usize {
        self.state.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the call and consume an injected failure, if any.
    fn enter(&self, state: &mut MemoryState, op: VaultOp, query: Option<&Query>) -> Option<Status> {
        state.calls.push(VaultCall {
            op,
            query: query.cloned(),
        });
        state.failures.remove(&op)
    }
}

impl Vault for MemoryVault {
    fn create_access_control(
        &self,
        protection: ProtectionClass,
        flags: AccessControlFlags,
    ) -> Result<AccessControl, Status> {
        let mut state = self.state.lock();
        if let Some(status) = self.enter(&mut state, VaultOp::CreateAccessControl, None) {
            return Err(status);
        }
        Ok(AccessControl::new(protection, flags))
    }

    fn copy_matching(&self, query: &Query) -> Result<Vec<Item>, Status> {
        let (items, needs_auth) = {
            let mut state = self.state.lock();
            if let Some(status) = self.enter(&mut state, VaultOp::CopyMatching, Some(query)) {
                return Err(status);
            }
            let found = state.table.search(query)?;
            let needs_auth = query.flag(Attr::ReturnData) == Some(true)
                && found.iter().any(|item| item.requires_authentication());
            let items: Vec<Item> = found.iter().map(|item| item.to_item(query)).collect();
            (items, needs_auth)
        };

        if needs_auth {
            let authenticator = Arc::clone(&*self.authenticator.lock());
            if !authenticator(query.str(Attr::OperationPrompt)) {
                return Err(Status::AUTH_FAILED);
            }
        }
        Ok(items)
    }

    fn add(&self, query: &Query) -> Status {
        let mut state = self.state.lock();
        if let Some(status) = self.enter(&mut state, VaultOp::Add, Some(query)) {
            return status;
        }
        state.table.add(query)
    }

    fn delete(&self, query: &Query) -> Status {
        let mut state = self.state.lock();
        if let Some(status) = self.enter(&mut state, VaultOp::Delete, Some(query)) {
            return status;
        }
        state.table.delete(query)
    }
}

impl MemoryVault {
    /// Snapshot of the stored access-control object for `key` in the local
    /// partition, for assertions.
    pub fn access_control_of(&self, key: &str) -> Option<AccessControl> {
        let state = self.state.lock();
        state
            .table
            .items()
            .iter()
            .find(|item: &&StoredItem| item.account.as_deref() == Some(key) && !item.synchronizable)
            .and_then(|item| item.access_control)
    }
}
