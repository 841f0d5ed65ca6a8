//! Encrypted file vault.
//!
//! Items live in one JSON document. Every value is encrypted on its own with
//! AES-256-GCM under a key derived from the master key and a per-item salt;
//! identity attributes stay in the clear so the document can be searched
//! after decryption of values only.
//!
//! The document is re-read for every call and rewritten atomically after
//! every mutation, so several processes can share one file as long as they
//! do not write at the same instant.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::table::{ItemTable, StoredItem};
use super::{Item, Vault};
use crate::access_control::AccessControl;
use crate::crypto;
use crate::error::{Result, StorageError};
use crate::master_key;
use crate::policy::ProtectionClass;
use crate::query::Query;
use crate::status::Status;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct VaultDocument {
    version: u32,
    #[serde(default)]
    items: Vec<DiskItem>,
}

/// On-disk representation of one item.
#[derive(Debug, Serialize, Deserialize)]
struct DiskItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_group: Option<String>,
    #[serde(default)]
    synchronizable: bool,
    protection: ProtectionClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_control: Option<AccessControl>,
    /// AES-256-GCM encrypted value, base64-encoded.
    encrypted_value: String,
    /// HKDF salt, hex-encoded.
    salt: String,
}

/// A vault persisted to an encrypted JSON file.
///
/// Access-control objects are recorded with the item but not enforced:
/// there is no authentication hardware behind a plain file.
pub struct FileVault {
    path: PathBuf,
    master_key: Zeroizing<Vec<u8>>,
    lock: Mutex<()>,
}

impl FileVault {
    /// Open the vault at `path`, resolving the master key from the
    /// environment or the key file next to it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let key_file = securekv_core::paths::key_file_for(&path);
        let master_key = master_key::load_or_create(&key_file)?;
        Ok(Self::with_master_key(path, master_key))
    }

    /// Open the vault at `path` with an explicit master key.
    pub fn with_master_key(path: impl Into<PathBuf>, master_key: Zeroizing<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            master_key,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ItemTable> {
        if !self.path.exists() {
            return Ok(ItemTable::default());
        }

        let data = fs::read_to_string(&self.path)?;
        let document: VaultDocument = serde_json::from_str(&data)?;
        if document.version != FORMAT_VERSION {
            return Err(StorageError::Corrupted(format!(
                "unsupported format version {}",
                document.version
            )));
        }

        let items = document
            .items
            .into_iter()
            .map(|item| self.decrypt_item(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(ItemTable::from_items(items))
    }

    fn save(&self, table: &ItemTable) -> Result<()> {
        let items = table
            .items()
            .iter()
            .map(|item| self.encrypt_item(item))
            .collect::<Result<Vec<_>>>()?;
        let document = VaultDocument {
            version: FORMAT_VERSION,
            items,
        };
        let json = serde_json::to_string_pretty(&document)?;
        write_atomic(&self.path, json.as_bytes())
    }

    fn encrypt_item(&self, item: &StoredItem) -> Result<DiskItem> {
        let (encrypted, salt) = crypto::encrypt(&self.master_key, &item.data)?;
        Ok(DiskItem {
            account: item.account.clone(),
            service: item.service.clone(),
            access_group: item.access_group.clone(),
            synchronizable: item.synchronizable,
            protection: item.protection,
            access_control: item.access_control,
            encrypted_value: base64::engine::general_purpose::STANDARD.encode(encrypted),
            salt: hex::encode(salt),
        })
    }

    fn decrypt_item(&self, item: DiskItem) -> Result<StoredItem> {
        let encrypted = base64::engine::general_purpose::STANDARD
            .decode(&item.encrypted_value)
            .map_err(|e| StorageError::Corrupted(format!("base64 decode failed: {e}")))?;
        let salt = hex::decode(&item.salt)
            .map_err(|e| StorageError::Corrupted(format!("hex decode failed: {e}")))?;
        let data = crypto::decrypt(&self.master_key, &encrypted, &salt)?;

        Ok(StoredItem {
            account: item.account,
            service: item.service,
            access_group: item.access_group,
            synchronizable: item.synchronizable,
            protection: item.protection,
            access_control: item.access_control,
            data,
        })
    }

    /// Load, apply `op`, and persist if it succeeded.
    fn mutate(&self, op: impl FnOnce(&mut ItemTable) -> Status) -> Status {
        let _guard = self.lock.lock();
        let mut table = match self.load() {
            Ok(table) => table,
            Err(e) => return report(&self.path, e),
        };

        let status = op(&mut table);
        if !status.is_success() {
            return status;
        }
        match self.save(&table) {
            Ok(()) => status,
            Err(e) => report(&self.path, e),
        }
    }
}

fn report(path: &Path, error: StorageError) -> Status {
    warn!(path = %path.display(), error = %error, "file vault access failed");
    error.status()
}

/// Write `data` to a temporary sibling with mode 0600, then rename over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        fs::create_dir_all(parent)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "vault file written");
    Ok(())
}

impl Vault for FileVault {
    fn copy_matching(&self, query: &Query) -> std::result::Result<Vec<Item>, Status> {
        let _guard = self.lock.lock();
        let table = self.load().map_err(|e| report(&self.path, e))?;
        let found = table.search(query)?;
        Ok(found.iter().map(|item| item.to_item(query)).collect())
    }

    fn add(&self, query: &Query) -> Status {
        self.mutate(|table| table.add(query))
    }

    fn delete(&self, query: &Query) -> Status {
        self.mutate(|table| table.delete(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::AccessControlFlags;
    use crate::query::{Attr, Value};
    use tempfile::TempDir;

    fn vault_in(dir: &TempDir) -> FileVault {
        FileVault::with_master_key(
            dir.path().join("vault.json"),
            Zeroizing::new(vec![7u8; crypto::KEY_SIZE]),
        )
    }

    fn add_query(key: &str, value: &str) -> Query {
        let mut query = Query::builder().key(Some(key)).build();
        query.insert(Attr::ValueData, Value::Data(value.as_bytes().to_vec()));
        query
    }

    fn read_query(key: &str) -> Query {
        Query::builder().key(Some(key)).return_data(Some(true)).build()
    }

    #[test]
    fn test_missing_file_is_empty_vault() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);

        assert_eq!(vault.copy_matching(&read_query("k")).unwrap_err(), Status::ITEM_NOT_FOUND);
        assert_eq!(vault.delete(&read_query("k")), Status::ITEM_NOT_FOUND);
        assert!(!vault.path().exists());
    }

    #[test]
    fn test_items_survive_reopen() {
        let dir = TempDir::new().unwrap();
        assert_eq!(vault_in(&dir).add(&add_query("k", "värde")), Status::SUCCESS);

        let reopened = vault_in(&dir);
        let items = reopened.copy_matching(&read_query("k")).unwrap();
        assert_eq!(items[0].data.as_deref(), Some("värde".as_bytes()));
    }

    #[test]
    fn test_values_are_not_stored_in_clear() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        vault.add(&add_query("api", "plaintext-secret"));

        let raw = fs::read_to_string(vault.path()).unwrap();
        assert!(raw.contains("\"api\""));
        assert!(!raw.contains("plaintext-secret"));
    }

    #[test]
    fn test_wrong_master_key_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        vault_in(&dir).add(&add_query("k", "v"));

        let other = FileVault::with_master_key(
            dir.path().join("vault.json"),
            Zeroizing::new(vec![9u8; crypto::KEY_SIZE]),
        );
        assert_eq!(other.copy_matching(&read_query("k")).unwrap_err(), Status::DECODE);
    }

    #[test]
    fn test_corrupted_document_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        fs::write(vault.path(), "{ not json").unwrap();

        assert_eq!(vault.copy_matching(&read_query("k")).unwrap_err(), Status::DECODE);
        assert_eq!(vault.add(&add_query("k", "v")), Status::DECODE);
    }

    #[test]
    fn test_duplicate_add_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        vault.add(&add_query("k", "first"));

        assert_eq!(vault.add(&add_query("k", "second")), Status::DUPLICATE_ITEM);
        let items = vault.copy_matching(&read_query("k")).unwrap();
        assert_eq!(items[0].data.as_deref(), Some(&b"first"[..]));
    }

    #[test]
    fn test_access_control_is_recorded() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        let mut query = add_query("k", "v");
        query.insert(
            Attr::AccessControl,
            Value::AccessControl(AccessControl::new(
                ProtectionClass::WhenUnlockedThisDeviceOnly,
                AccessControlFlags::BIOMETRY_ANY,
            )),
        );
        assert_eq!(vault.add(&query), Status::SUCCESS);

        let raw = fs::read_to_string(vault.path()).unwrap();
        let document: VaultDocument = serde_json::from_str(&raw).unwrap();
        let stored = document.items[0].access_control.unwrap();
        assert_eq!(stored.flags, AccessControlFlags::BIOMETRY_ANY);
        assert_eq!(document.items[0].protection, ProtectionClass::WhenUnlockedThisDeviceOnly);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        vault.add(&add_query("k", "v"));

        let mode = fs::metadata(vault.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_open_creates_key_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.json");
        if securekv_core::env::get_var(securekv_core::env::vars::MASTER_KEY).is_some() {
            return;
        }

        let vault = FileVault::open(&path).unwrap();
        vault.add(&add_query("k", "v"));
        assert!(dir.path().join("vault.key").exists());

        let reopened = FileVault::open(&path).unwrap();
        assert!(reopened.copy_matching(&read_query("k")).is_ok());
    }
}
