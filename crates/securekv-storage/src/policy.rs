//! Accessibility policy resolution.
//!
//! Callers pick one of five portable accessibility tokens; the vault wants a
//! protection-class token. Parsing is lenient: a missing or unrecognized
//! token resolves to [`Accessibility::DEFAULT`] instead of failing the call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Portable accessibility selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    /// Only while a device passcode is set; never leaves the device.
    Passcode,
    /// While the device is unlocked; migrates on backup restore.
    Unlocked,
    /// While the device is unlocked; never leaves the device.
    UnlockedThisDevice,
    /// After the first unlock since boot; migrates on backup restore.
    FirstUnlock,
    /// After the first unlock since boot; never leaves the device.
    FirstUnlockThisDevice,
}

impl Accessibility {
    /// Applied when the token is absent or unrecognized.
    pub const DEFAULT: Self = Self::Unlocked;

    /// Strict parse of a wire token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "passcode" => Some(Self::Passcode),
            "unlocked" => Some(Self::Unlocked),
            "unlocked_this_device" => Some(Self::UnlockedThisDevice),
            "first_unlock" => Some(Self::FirstUnlock),
            "first_unlock_this_device" => Some(Self::FirstUnlockThisDevice),
            _ => None,
        }
    }

    /// Lenient parse: absent or unknown tokens fall back to [`Self::DEFAULT`].
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            None => Self::DEFAULT,
            Some(token) => Self::parse(token).unwrap_or(Self::DEFAULT),
        }
    }

    /// The wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passcode => "passcode",
            Self::Unlocked => "unlocked",
            Self::UnlockedThisDevice => "unlocked_this_device",
            Self::FirstUnlock => "first_unlock",
            Self::FirstUnlockThisDevice => "first_unlock_this_device",
        }
    }

    /// The native protection class for this selector.
    pub fn protection_class(self) -> ProtectionClass {
        match self {
            Self::Passcode => ProtectionClass::WhenPasscodeSetThisDeviceOnly,
            Self::Unlocked => ProtectionClass::WhenUnlocked,
            Self::UnlockedThisDevice => ProtectionClass::WhenUnlockedThisDeviceOnly,
            Self::FirstUnlock => ProtectionClass::AfterFirstUnlock,
            Self::FirstUnlockThisDevice => ProtectionClass::AfterFirstUnlockThisDeviceOnly,
        }
    }
}

impl Default for Accessibility {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve an optional wire token straight to its protection class.
pub fn resolve_protection(token: Option<&str>) -> ProtectionClass {
    Accessibility::from_token(token).protection_class()
}

/// Native protection class (`kSecAttrAccessible*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionClass {
    WhenPasscodeSetThisDeviceOnly,
    WhenUnlocked,
    WhenUnlockedThisDeviceOnly,
    AfterFirstUnlock,
    AfterFirstUnlockThisDeviceOnly,
}

impl ProtectionClass {
    /// The native constant's string value.
    pub const fn token(self) -> &'static str {
        match self {
            Self::WhenPasscodeSetThisDeviceOnly => "akpu",
            Self::WhenUnlocked => "ak",
            Self::WhenUnlockedThisDeviceOnly => "aku",
            Self::AfterFirstUnlock => "ck",
            Self::AfterFirstUnlockThisDeviceOnly => "cku",
        }
    }

    /// Classes that are excluded from backups and cannot be synchronized.
    pub const fn is_this_device_only(self) -> bool {
        matches!(
            self,
            Self::WhenPasscodeSetThisDeviceOnly
                | Self::WhenUnlockedThisDeviceOnly
                | Self::AfterFirstUnlockThisDeviceOnly
        )
    }
}

impl Default for ProtectionClass {
    fn default() -> Self {
        Accessibility::DEFAULT.protection_class()
    }
}
