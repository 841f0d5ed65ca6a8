//! Item table with native matching semantics, shared by the portable backends.

use super::Item;
use crate::access_control::AccessControl;
use crate::policy::ProtectionClass;
use crate::query::{Attr, MatchLimit, Query, GENERIC_PASSWORD};
use crate::status::Status;

/// A stored entry.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct StoredItem {
    pub(crate) account: Option<String>,
    pub(crate) service: Option<String>,
    pub(crate) access_group: Option<String>,
    pub(crate) synchronizable: bool,
    pub(crate) protection: ProtectionClass,
    pub(crate) access_control: Option<AccessControl>,
    pub(crate) data: Vec<u8>,
}

impl std::fmt::Debug for StoredItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredItem")
            .field("account", &self.account)
            .field("service", &self.service)
            .field("access_group", &self.access_group)
            .field("synchronizable", &self.synchronizable)
            .field("protection", &self.protection)
            .field("access_control", &self.access_control)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

impl StoredItem {
    /// Validate an add query the way the native store does.
    fn from_add_query(query: &Query) -> Result<Self, Status> {
        check_class(query)?;

        let data = query.data().ok_or(Status::PARAM)?.to_vec();
        let synchronizable = query.flag(Attr::Synchronizable).unwrap_or(false);
        let access_control = query.access_control().copied();

        // The access-control object carries its own protection class.
        if access_control.is_some() && query.contains(Attr::Accessible) {
            return Err(Status::PARAM);
        }
        if synchronizable && access_control.is_some() {
            return Err(Status::PARAM);
        }

        let protection = access_control
            .map(|ac| ac.protection)
            .or_else(|| query.protection())
            .unwrap_or_default();
        if synchronizable && protection.is_this_device_only() {
            return Err(Status::PARAM);
        }

        Ok(Self {
            account: query.str(Attr::Account).map(str::to_owned),
            service: query.str(Attr::Service).map(str::to_owned),
            access_group: query.str(Attr::AccessGroup).map(str::to_owned),
            synchronizable,
            protection,
            access_control,
            data,
        })
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.account == other.account
            && self.service == other.service
            && self.access_group == other.access_group
            && self.synchronizable == other.synchronizable
    }

    fn matches(&self, query: &Query) -> bool {
        let attr_matches = |attr: Attr, stored: &Option<String>| match query.str(attr) {
            Some(wanted) => stored.as_deref() == Some(wanted),
            None => true,
        };

        attr_matches(Attr::Account, &self.account)
            && attr_matches(Attr::Service, &self.service)
            && attr_matches(Attr::AccessGroup, &self.access_group)
            && query.flag(Attr::Synchronizable).unwrap_or(false) == self.synchronizable
            && query.protection().map_or(true, |p| p == self.protection)
    }

    /// Whether releasing this item's data needs user authentication.
    pub(crate) fn requires_authentication(&self) -> bool {
        self.access_control
            .is_some_and(|ac| ac.flags.requires_authentication())
    }

    /// Shape a result according to the query's return flags.
    pub(crate) fn to_item(&self, query: &Query) -> Item {
        Item {
            account: if query.flag(Attr::ReturnAttributes) == Some(true) {
                self.account.clone()
            } else {
                None
            },
            data: if query.flag(Attr::ReturnData) == Some(true) {
                Some(self.data.clone())
            } else {
                None
            },
        }
    }
}

fn check_class(query: &Query) -> Result<(), Status> {
    match query.str(Attr::Class) {
        Some(GENERIC_PASSWORD) => Ok(()),
        _ => Err(Status::PARAM),
    }
}

/// Ordered collection of items.
#[derive(Clone, Default)]
pub(crate) struct ItemTable {
    items: Vec<StoredItem>,
}

impl ItemTable {
    pub(crate) fn from_items(items: Vec<StoredItem>) -> Self {
        Self { items }
    }

    pub(crate) fn items(&self) -> &[StoredItem] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Matching items in insertion order, honoring the match limit.
    pub(crate) fn search(&self, query: &Query) -> Result<Vec<&StoredItem>, Status> {
        check_class(query)?;

        let mut found: Vec<&StoredItem> = self.items.iter().filter(|i| i.matches(query)).collect();
        if found.is_empty() {
            return Err(Status::ITEM_NOT_FOUND);
        }
        if query.match_limit() == MatchLimit::One {
            found.truncate(1);
        }
        Ok(found)
    }

    pub(crate) fn add(&mut self, query: &Query) -> Status {
        let item = match StoredItem::from_add_query(query) {
            Ok(item) => item,
            Err(status) => return status,
        };
        if self.items.iter().any(|existing| existing.same_identity(&item)) {
            return Status::DUPLICATE_ITEM;
        }
        self.items.push(item);
        Status::SUCCESS
    }

    pub(crate) fn delete(&mut self, query: &Query) -> Status {
        if let Err(status) = check_class(query) {
            return status;
        }

        let before = self.items.len();
        self.items.retain(|item| !item.matches(query));
        if self.items.len() == before {
            Status::ITEM_NOT_FOUND
        } else {
            Status::SUCCESS
        }
    }
}
