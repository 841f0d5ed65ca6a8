//! Operation results.
//!
//! Every engine call returns a [`Response`]: the native status plus an
//! optional payload. Expected conditions (not-found, decode failures) are
//! statuses, not Rust errors.

use crate::status::Status;
use securekv_core::SecretString;
use serde::Serialize;
use std::collections::BTreeMap;

/// Payload carried by a [`Response`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    #[default]
    None,
    Bool(bool),
    Text(SecretString),
    Map(BTreeMap<String, SecretString>),
}

/// Result of one storage operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: Status,
    pub value: Payload,
}

impl Response {
    /// Success with no payload.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A bare status with no payload.
    pub fn status(status: Status) -> Self {
        Self {
            status,
            value: Payload::None,
        }
    }

    pub fn with_bool(value: bool) -> Self {
        Self {
            status: Status::SUCCESS,
            value: Payload::Bool(value),
        }
    }

    pub fn with_text(value: impl Into<SecretString>) -> Self {
        Self {
            status: Status::SUCCESS,
            value: Payload::Text(value.into()),
        }
    }

    pub fn with_map(entries: BTreeMap<String, SecretString>) -> Self {
        Self {
            status: Status::SUCCESS,
            value: Payload::Map(entries),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The text payload, if there is one.
    pub fn text(&self) -> Option<&SecretString> {
        match &self.value {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn flag(&self) -> Option<bool> {
        match self.value {
            Payload::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn map(&self) -> Option<&BTreeMap<String, SecretString>> {
        match &self.value {
            Payload::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<Status> for Response {
    fn from(status: Status) -> Self {
        Self::status(status)
    }
}
