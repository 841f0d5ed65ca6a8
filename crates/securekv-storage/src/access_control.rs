//! Access-control compilation.
//!
//! A portable selector becomes a set of native gating flags, which the vault
//! then turns into an access-control object bound to a protection class.
//! Once compiled, the object replaces the plain accessibility attribute in
//! the write query; vaults reject queries that specify both.

use crate::policy::ProtectionClass;
use crate::status::Status;
use crate::vault::Vault;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use tracing::{debug, warn};

/// Portable access-control selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessControlKind {
    /// Biometry or device passcode, whichever is available.
    UserPresence,
    /// Any enrolled biometry; survives enrollment changes.
    BiometryAny,
    /// Biometry, invalidated when the enrolled set changes.
    BiometryCurrentSet,
    /// Device passcode only.
    DevicePasscode,
}

impl AccessControlKind {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "user_presence" => Some(Self::UserPresence),
            "biometry_any" => Some(Self::BiometryAny),
            "biometry_current_set" => Some(Self::BiometryCurrentSet),
            "device_passcode" => Some(Self::DevicePasscode),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserPresence => "user_presence",
            Self::BiometryAny => "biometry_any",
            Self::BiometryCurrentSet => "biometry_current_set",
            Self::DevicePasscode => "device_passcode",
        }
    }

    pub fn flags(self) -> AccessControlFlags {
        match self {
            Self::UserPresence => AccessControlFlags::USER_PRESENCE,
            Self::BiometryAny => AccessControlFlags::BIOMETRY_ANY,
            Self::BiometryCurrentSet => AccessControlFlags::BIOMETRY_CURRENT_SET,
            Self::DevicePasscode => AccessControlFlags::DEVICE_PASSCODE,
        }
    }
}

impl fmt::Display for AccessControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native `SecAccessControlCreateFlags` bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessControlFlags(u64);

impl AccessControlFlags {
    pub const NONE: Self = Self(0);
    pub const USER_PRESENCE: Self = Self(1 << 0);
    pub const BIOMETRY_ANY: Self = Self(1 << 1);
    pub const BIOMETRY_CURRENT_SET: Self = Self(1 << 3);
    pub const DEVICE_PASSCODE: Self = Self(1 << 4);

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags that make the vault ask for user authentication.
    pub const fn requires_authentication(self) -> bool {
        !self.is_empty()
    }
}

impl BitOr for AccessControlFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Map a wire selector to flags.
///
/// An unrecognized selector deliberately yields [`AccessControlFlags::NONE`]
/// (an access-control object with no gating) instead of failing the write.
pub fn flags_for(selector: &str) -> AccessControlFlags {
    match AccessControlKind::parse(selector) {
        Some(kind) => kind.flags(),
        None => {
            warn!(selector, "unrecognized access control, compiling without flags");
            AccessControlFlags::NONE
        }
    }
}

/// A compiled access-control object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessControl {
    pub protection: ProtectionClass,
    pub flags: AccessControlFlags,
}

impl AccessControl {
    pub fn new(protection: ProtectionClass, flags: AccessControlFlags) -> Self {
        Self { protection, flags }
    }
}

/// Compile `selector` for `protection` through the vault.
///
/// Any construction failure is reported as [`Status::PARAM`].
pub fn compile(
    vault: &dyn Vault,
    selector: &str,
    protection: ProtectionClass,
) -> Result<AccessControl, Status> {
    let flags = flags_for(selector);
    vault
        .create_access_control(protection, flags)
        .map_err(|status| {
            debug!(selector, %status, "access control construction failed");
            Status::PARAM
        })
}
