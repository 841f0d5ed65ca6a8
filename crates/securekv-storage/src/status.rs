//! Native result codes.
//!
//! Every operation reports a [`Status`]. Most values are passed through from
//! the vault verbatim; [`Status::DECODE`] and [`Status::PARAM`] are also
//! synthesized by the engine itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A native vault result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(i32);

impl Status {
    /// The call succeeded.
    pub const SUCCESS: Self = Self(0);
    /// No entry matched the query.
    pub const ITEM_NOT_FOUND: Self = Self(-25300);
    /// An entry with the same identity already exists.
    pub const DUPLICATE_ITEM: Self = Self(-25299);
    /// Invalid parameters, or a native object could not be constructed.
    pub const PARAM: Self = Self(-50);
    /// Stored bytes could not be decoded as text.
    pub const DECODE: Self = Self(-26275);
    /// The user failed or cancelled authentication.
    pub const AUTH_FAILED: Self = Self(-25293);
    /// Authentication was required but user interaction is not allowed.
    pub const INTERACTION_NOT_ALLOWED: Self = Self(-25308);
    /// Backing storage could not be read or written.
    pub const IO: Self = Self(-36);

    /// Wrap a raw native code.
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// The raw native code.
    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    pub const fn is_not_found(self) -> bool {
        self.0 == Self::ITEM_NOT_FOUND.0
    }

    /// Short human-readable description for the codes this crate knows.
    pub fn description(self) -> &'static str {
        match self {
            Self::SUCCESS => "success",
            Self::ITEM_NOT_FOUND => "item not found",
            Self::DUPLICATE_ITEM => "duplicate item",
            Self::PARAM => "invalid parameters",
            Self::DECODE => "stored value is not valid UTF-8",
            Self::AUTH_FAILED => "authentication failed",
            Self::INTERACTION_NOT_ALLOWED => "user interaction not allowed",
            Self::IO => "storage I/O error",
            _ => "vault error",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.0)
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self(code)
    }
}
