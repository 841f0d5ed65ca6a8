//! Secure key-value credential storage.
//!
//! One API (`contains_key`, `read`, `read_all`, `write`, `delete`,
//! `delete_all`) over a platform credential vault, with per-entry policy:
//! accessibility class, optional user-authentication gating, and optional
//! cross-device synchronization.
//!
//! Layers, leaf first:
//!
//! - [`policy`]: accessibility tokens to native protection classes
//! - [`access_control`]: access-control selectors to native gating flags
//! - [`query`]: the predicate set handed to the vault
//! - [`existence`]: existence probing across both synchronizable partitions
//! - [`storage`]: the entry operations
//! - [`dispatch`]: flat-map call routing for bridge layers
//! - [`worker`]: async wrappers running on the blocking pool
//!
//! Vault backends live in [`vault`].

pub mod access_control;
pub mod backend;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod existence;
pub mod master_key;
pub mod options;
pub mod policy;
pub mod query;
pub mod response;
pub mod status;
pub mod storage;
pub mod vault;
pub mod worker;

pub use dispatch::{Arguments, Dispatcher, Method, Request};
pub use error::{Result, StorageError};
pub use options::{DeleteOptions, ListOptions, ReadOptions, Scope, WriteOptions};
pub use policy::{Accessibility, ProtectionClass};
pub use response::{Payload, Response};
pub use status::Status;
pub use storage::SecureStorage;
pub use worker::{AsyncDispatcher, AsyncSecureStorage, CredentialStore};
