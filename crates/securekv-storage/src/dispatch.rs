//! Flat-map call dispatch.
//!
//! The bridging layer sends a method name and a flat JSON object of named
//! arguments; this module decodes them, fills in configured defaults, and
//! routes the call to [`SecureStorage`]. Malformed calls come back as
//! [`Status::PARAM`], never as a panic or a Rust error.

use std::fmt;
use std::str::FromStr;

use securekv_core::config::EntryDefaults;
use securekv_core::SecretString;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::options::{DeleteOptions, ListOptions, ReadOptions, Scope, WriteOptions};
use crate::policy::Accessibility;
use crate::response::Response;
use crate::status::Status;
use crate::storage::SecureStorage;

/// Operation names accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    ContainsKey,
    Read,
    ReadAll,
    Write,
    Delete,
    DeleteAll,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Self::ContainsKey,
        Self::Read,
        Self::ReadAll,
        Self::Write,
        Self::Delete,
        Self::DeleteAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContainsKey => "containsKey",
            Self::Read => "read",
            Self::ReadAll => "readAll",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::DeleteAll => "deleteAll",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or(Status::PARAM)
    }
}

/// Named call arguments. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Arguments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub synchronizable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control: Option<String>,
}

/// Accept `true`/`false` as booleans or as strings.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => match s.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(de::Error::custom(format!(
                "synchronizable must be a boolean, got {other:?}"
            ))),
        },
    }
}

/// A call as it arrives from the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: serde_json::Value::Null,
        }
    }

    pub fn with_arguments(mut self, arguments: serde_json::Value) -> Self {
        self.arguments = arguments;
        self
    }
}

/// Routes decoded calls to a [`SecureStorage`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    storage: SecureStorage,
    defaults: EntryDefaults,
}

impl Dispatcher {
    pub fn new(storage: SecureStorage) -> Self {
        Self {
            storage,
            defaults: EntryDefaults::default(),
        }
    }

    /// Attributes applied when a call leaves them out.
    pub fn with_defaults(mut self, defaults: EntryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn storage(&self) -> &SecureStorage {
        &self.storage
    }

    /// Decode and run a raw request.
    pub fn handle(&self, request: &Request) -> Response {
        let method = match request.method.parse::<Method>() {
            Ok(method) => method,
            Err(status) => {
                warn!(method = %request.method, "unknown method");
                return Response::status(status);
            }
        };

        let arguments = match &request.arguments {
            serde_json::Value::Null => Arguments::default(),
            raw => match Arguments::deserialize(raw) {
                Ok(arguments) => arguments,
                Err(e) => {
                    warn!(%method, error = %e, "malformed arguments");
                    return Response::status(Status::PARAM);
                }
            },
        };

        self.call(method, arguments)
    }

    /// Run a decoded call.
    pub fn call(&self, method: Method, arguments: Arguments) -> Response {
        debug!(%method, "dispatch");
        let arguments = self.apply_defaults(arguments);
        if let Some(token) = arguments.accessibility.as_deref() {
            if Accessibility::parse(token).is_none() {
                warn!(%method, token, "unrecognized accessibility, using {}", Accessibility::DEFAULT);
            }
        }
        let scope = Scope::new(arguments.group_id, arguments.account_name);

        match method {
            Method::ContainsKey => match arguments.key {
                Some(key) => self.storage.contains_key(&key, &scope),
                None => missing(method, "key"),
            },
            Method::Read => match arguments.key {
                Some(key) => {
                    let options = ReadOptions {
                        synchronizable: arguments.synchronizable,
                        access_control: arguments.access_control,
                    };
                    self.storage.read(&key, &scope, &options)
                }
                None => missing(method, "key"),
            },
            Method::ReadAll => {
                let options = ListOptions {
                    synchronizable: arguments.synchronizable,
                    accessibility: arguments.accessibility,
                };
                self.storage.read_all(&scope, &options)
            }
            Method::Write => {
                let Some(key) = arguments.key else {
                    return missing(method, "key");
                };
                let Some(value) = arguments.value else {
                    return missing(method, "value");
                };
                let options = WriteOptions {
                    synchronizable: arguments.synchronizable,
                    accessibility: arguments.accessibility,
                    access_control: arguments.access_control,
                };
                self.storage
                    .write(&key, value.expose_secret(), &scope, &options)
            }
            Method::Delete => match arguments.key {
                Some(key) => {
                    let options = DeleteOptions {
                        synchronizable: arguments.synchronizable,
                    };
                    self.storage.delete(&key, &scope, &options)
                }
                None => missing(method, "key"),
            },
            Method::DeleteAll => {
                let options = DeleteOptions {
                    synchronizable: arguments.synchronizable,
                };
                self.storage.delete_all(&scope, &options)
            }
        }
    }

    fn apply_defaults(&self, mut arguments: Arguments) -> Arguments {
        let defaults = &self.defaults;
        if arguments.group_id.is_none() {
            arguments.group_id = defaults.group_id.clone();
        }
        if arguments.account_name.is_none() {
            arguments.account_name = defaults.account_name.clone();
        }
        if arguments.accessibility.is_none() {
            arguments.accessibility = defaults.accessibility.clone();
        }
        if arguments.synchronizable.is_none() && defaults.synchronizable {
            arguments.synchronizable = Some(true);
        }
        // decided after the effective partition is known
        if arguments.access_control.is_none() && arguments.synchronizable != Some(true) {
            arguments.access_control = defaults.access_control.clone();
        }
        arguments
    }
}

fn missing(method: Method, argument: &str) -> Response {
    warn!(%method, argument, "missing required argument");
    Response::status(Status::PARAM)
}
