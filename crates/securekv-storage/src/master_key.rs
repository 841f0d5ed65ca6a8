//! Master key resolution for the file-backed vault.
//!
//! The master key is resolved in priority order:
//! 1. `SECUREKV_MASTER_KEY` environment variable (hex-encoded)
//! 2. The key file next to the vault document
//! 3. Generate a new key and write it to the key file

use std::fs;
use std::io::Write;
use std::path::Path;

use securekv_core::env::{self, vars};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_SIZE};
use crate::error::{Result, StorageError};

/// Retrieve the master key, creating one at `key_file` if none exists yet.
pub fn load_or_create(key_file: &Path) -> Result<Zeroizing<Vec<u8>>> {
    resolve(env::get_var(vars::MASTER_KEY), key_file)
}

pub(crate) fn resolve(env_value: Option<String>, key_file: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(hex_key) = env_value {
        debug!("using master key from environment variable");
        let hex_key = Zeroizing::new(hex_key);
        return decode(&hex_key, vars::MASTER_KEY);
    }

    if key_file.exists() {
        debug!(path = %key_file.display(), "using master key from key file");
        let contents = Zeroizing::new(fs::read_to_string(key_file)?);
        return decode(&contents, &key_file.display().to_string());
    }

    debug!(path = %key_file.display(), "generating new master key");
    let key = crypto::generate_master_key();
    write_key_file(key_file, &key)?;
    Ok(key)
}

fn decode(hex_key: &str, source: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = Zeroizing::new(
        hex::decode(hex_key.trim())
            .map_err(|e| StorageError::MasterKey(format!("invalid hex in {source}: {e}")))?,
    );
    if key.len() != KEY_SIZE {
        return Err(StorageError::MasterKey(format!(
            "{source} must decode to exactly {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    Ok(key)
}

fn write_key_file(path: &Path, key: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let encoded = Zeroizing::new(hex::encode(key));
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(encoded.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_env_value_takes_priority() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("vault.key");
        let hex_key = "ab".repeat(KEY_SIZE);

        let key = resolve(Some(hex_key), &key_file).unwrap();
        assert_eq!(key.as_slice(), &[0xab; KEY_SIZE]);
        assert!(!key_file.exists());
    }

    #[test]
    fn test_generated_key_is_persisted() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("nested").join("vault.key");

        let first = resolve(None, &key_file).unwrap();
        let second = resolve(None, &key_file).unwrap();

        assert_eq!(first.len(), KEY_SIZE);
        assert_eq!(first.as_slice(), second.as_slice());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("vault.key");
        resolve(None, &key_file).unwrap();

        let mode = fs::metadata(&key_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_rejects_bad_keys() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("vault.key");

        let not_hex = resolve(Some("zz".to_string()), &key_file);
        assert!(matches!(not_hex, Err(StorageError::MasterKey(_))));

        let short = resolve(Some("abcd".to_string()), &key_file);
        assert!(matches!(short, Err(StorageError::MasterKey(_))));
    }
}
