//! The native vault seam.
//!
//! [`Vault`] has the shape of the platform item API: build a query, hand it
//! over, get a status back. Everything above this trait is platform-neutral.
//!
//! Backends:
//!
//! - [`MemoryVault`]: process-local, for tests and throwaway sessions
//! - [`FileVault`]: encrypted JSON document for hosts without an OS vault
//! - `KeychainVault`: Apple Security framework (Apple targets only)
//!
//! All backends share the native matching rules: a present identity
//! attribute must match exactly, an absent one matches anything, and an
//! absent `synchronizable` attribute matches only non-synchronizable items.

mod file;
mod memory;
mod table;

#[cfg(target_vendor = "apple")]
mod keychain;

pub use file::FileVault;
pub use memory::{Authenticator, MemoryVault, VaultCall};

#[cfg(target_vendor = "apple")]
pub use keychain::KeychainVault;

use crate::access_control::{AccessControl, AccessControlFlags};
use crate::policy::ProtectionClass;
use crate::query::Query;
use crate::status::Status;
use std::fmt;

/// One search result.
///
/// Which fields are filled depends on the return-shape flags of the query.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Item {
    /// The entry key, when attributes were requested.
    pub account: Option<String>,
    /// Stored bytes, when data was requested.
    pub data: Option<Vec<u8>>,
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("account", &self.account)
            .field("data", &self.data.as_ref().map(|d| d.len()))
            .finish()
    }
}

/// Vault entry points, used for call logs and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultOp {
    CreateAccessControl,
    CopyMatching,
    Add,
    Delete,
}

/// A platform credential vault.
///
/// Each call is atomic on its own; nothing spans calls. Calls touching
/// access-controlled items may block until the user authenticates.
pub trait Vault: Send + Sync {
    /// Build a native access-control object.
    fn create_access_control(
        &self,
        protection: ProtectionClass,
        flags: AccessControlFlags,
    ) -> Result<AccessControl, Status> {
        Ok(AccessControl::new(protection, flags))
    }

    /// Search. Returns `Err(Status::ITEM_NOT_FOUND)` when nothing matches.
    fn copy_matching(&self, query: &Query) -> Result<Vec<Item>, Status>;

    /// Insert a new item. Fails with [`Status::DUPLICATE_ITEM`] if its
    /// identity is taken; there is no in-place update.
    fn add(&self, query: &Query) -> Status;

    /// Remove every matching item, or return [`Status::ITEM_NOT_FOUND`].
    fn delete(&self, query: &Query) -> Status;
}
