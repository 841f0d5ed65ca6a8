//! Per-call inputs.

use crate::status::Status;

/// Group and service-account namespace an entry lives in.
///
/// Together with the key and the synchronizable partition this forms an
/// entry's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub group_id: Option<String>,
    pub account_name: Option<String>,
}

impl Scope {
    pub fn new(group_id: Option<String>, account_name: Option<String>) -> Self {
        Self {
            group_id,
            account_name,
        }
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account_name.as_deref()
    }
}

/// An access-control selector, with the empty string treated as absent.
pub(crate) fn selector(access_control: &Option<String>) -> Option<&str> {
    access_control.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Partition to read from; `None` reads the local partition.
    pub synchronizable: Option<bool>,
    /// When set, the read carries an authentication prompt.
    pub access_control: Option<String>,
}

impl ReadOptions {
    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.synchronizable = Some(synchronizable);
        self
    }

    pub fn access_control(mut self, selector: impl Into<String>) -> Self {
        self.access_control = Some(selector.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub synchronizable: Option<bool>,
    /// Only list entries stored with this accessibility.
    pub accessibility: Option<String>,
}

impl ListOptions {
    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.synchronizable = Some(synchronizable);
        self
    }

    pub fn accessibility(mut self, token: impl Into<String>) -> Self {
        self.accessibility = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub synchronizable: Option<bool>,
    /// Accessibility token; absent or unknown resolves to the default.
    pub accessibility: Option<String>,
    /// Access-control selector; replaces the plain accessibility attribute.
    pub access_control: Option<String>,
}

impl WriteOptions {
    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.synchronizable = Some(synchronizable);
        self
    }

    pub fn accessibility(mut self, token: impl Into<String>) -> Self {
        self.accessibility = Some(token.into());
        self
    }

    pub fn access_control(mut self, selector: impl Into<String>) -> Self {
        self.access_control = Some(selector.into());
        self
    }

    /// Hardware-gated entries cannot be synchronized.
    pub fn validate(&self) -> Result<(), Status> {
        if self.synchronizable == Some(true) && selector(&self.access_control).is_some() {
            return Err(Status::PARAM);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Partition to delete from; `None` targets the local partition.
    pub synchronizable: Option<bool>,
}

impl DeleteOptions {
    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.synchronizable = Some(synchronizable);
        self
    }
}
