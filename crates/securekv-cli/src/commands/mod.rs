//! CLI command implementations.

pub mod call;
pub mod config;
pub mod entries;

use securekv_storage::Response;

/// Fail the command unless the call succeeded.
pub(crate) fn ensure_success(operation: &str, response: &Response) -> anyhow::Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} failed: {}", operation, response.status)
    }
}

