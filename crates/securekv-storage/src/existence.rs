//! Entry existence across both synchronizable partitions.
//!
//! Vaults treat the synchronizable flag as part of an item's identity, and a
//! query without the flag only sees local items. An existence check has to
//! probe both partitions: synchronizable first, then local.

use crate::options::Scope;
use crate::query::Query;
use crate::status::Status;
use crate::vault::Vault;
use tracing::trace;

/// Whether an entry for `key` exists in either partition.
///
/// Errors other than not-found are propagated; they are never reported as
/// "does not exist".
pub fn exists(vault: &dyn Vault, key: &str, scope: &Scope) -> Result<bool, Status> {
    for synchronizable in [true, false] {
        let probe = Query::builder()
            .key(Some(key))
            .group_id(scope.group_id())
            .account_name(scope.account_name())
            .synchronizable(Some(synchronizable))
            .return_data(Some(false))
            .build();

        match vault.copy_matching(&probe) {
            Ok(_) => {
                trace!(key, synchronizable, "entry found");
                return Ok(true);
            }
            Err(status) if status.is_not_found() => continue,
            Err(status) => return Err(status),
        }
    }
    Ok(false)
}
