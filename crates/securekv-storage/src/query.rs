//! Query construction.
//!
//! A [`Query`] is the predicate set handed to the vault: store class, item
//! identity attributes, protection attributes, and return-shape flags. It is
//! built per call and never persisted. Only attributes that were supplied
//! appear in it; to the vault an absent attribute means something different
//! from a present `false` or empty one.

use crate::access_control::AccessControl;
use crate::policy::{self, ProtectionClass};
use std::collections::BTreeMap;

/// Item class for every entry this crate manages (`kSecClassGenericPassword`).
pub const GENERIC_PASSWORD: &str = "genp";

/// Query attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Class,
    /// The entry key.
    Account,
    /// The service-account namespace.
    Service,
    AccessGroup,
    Synchronizable,
    Accessible,
    AccessControl,
    ReturnData,
    ReturnAttributes,
    MatchLimit,
    ValueData,
    /// Text the OS shows when it has to authenticate the user.
    OperationPrompt,
}

impl Attr {
    /// The native constant's string value.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Account => "acct",
            Self::Service => "svce",
            Self::AccessGroup => "agrp",
            Self::Synchronizable => "sync",
            Self::Accessible => "pdmn",
            Self::AccessControl => "accc",
            Self::ReturnData => "r_Data",
            Self::ReturnAttributes => "r_Attributes",
            Self::MatchLimit => "m_Limit",
            Self::ValueData => "v_Data",
            Self::OperationPrompt => "u_OpPrompt",
        }
    }
}

/// How many results a search returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLimit {
    One,
    All,
}

impl MatchLimit {
    pub const fn token(self) -> &'static str {
        match self {
            Self::One => "m_LimitOne",
            Self::All => "m_LimitAll",
        }
    }
}

/// Attribute value.
#[derive(Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Data(Vec<u8>),
    Protection(ProtectionClass),
    AccessControl(AccessControl),
    Limit(MatchLimit),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            // never print entry values
            Self::Data(d) => write!(f, "<{} bytes>", d.len()),
            Self::Protection(p) => write!(f, "{}", p.token()),
            Self::AccessControl(ac) => write!(f, "{ac:?}"),
            Self::Limit(l) => write!(f, "{}", l.token()),
        }
    }
}

/// A predicate set for one vault call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    attrs: BTreeMap<Attr, Value>,
}

impl Query {
    /// An empty query with no class.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn insert(&mut self, attr: Attr, value: Value) -> Option<Value> {
        self.attrs.insert(attr, value)
    }

    pub fn get(&self, attr: Attr) -> Option<&Value> {
        self.attrs.get(&attr)
    }

    pub fn contains(&self, attr: Attr) -> bool {
        self.attrs.contains_key(&attr)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attr, &Value)> {
        self.attrs.iter().map(|(attr, value)| (*attr, value))
    }

    pub fn str(&self, attr: Attr) -> Option<&str> {
        match self.get(attr) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, attr: Attr) -> Option<bool> {
        match self.get(attr) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&[u8]> {
        match self.get(Attr::ValueData) {
            Some(Value::Data(d)) => Some(d),
            _ => None,
        }
    }

    pub fn protection(&self) -> Option<ProtectionClass> {
        match self.get(Attr::Accessible) {
            Some(Value::Protection(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn access_control(&self) -> Option<&AccessControl> {
        match self.get(Attr::AccessControl) {
            Some(Value::AccessControl(ac)) => Some(ac),
            _ => None,
        }
    }

    pub fn match_limit(&self) -> MatchLimit {
        match self.get(Attr::MatchLimit) {
            Some(Value::Limit(limit)) => *limit,
            _ => MatchLimit::One,
        }
    }
}

/// Assembles the canonical query from optional inputs.
///
/// Each setter takes an `Option`; `None` leaves the attribute out entirely.
/// No business rules are checked here.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    key: Option<String>,
    group_id: Option<String>,
    account_name: Option<String>,
    synchronizable: Option<bool>,
    accessibility: Option<String>,
    return_data: Option<bool>,
}

impl QueryBuilder {
    /// Entry key; absent matches every key.
    pub fn key(mut self, key: Option<&str>) -> Self {
        self.key = key.map(str::to_owned);
        self
    }

    pub fn group_id(mut self, group_id: Option<&str>) -> Self {
        self.group_id = group_id.map(str::to_owned);
        self
    }

    pub fn account_name(mut self, account_name: Option<&str>) -> Self {
        self.account_name = account_name.map(str::to_owned);
        self
    }

    pub fn synchronizable(mut self, synchronizable: Option<bool>) -> Self {
        self.synchronizable = synchronizable;
        self
    }

    /// Accessibility token, resolved leniently when the query is built.
    pub fn accessibility(mut self, accessibility: Option<&str>) -> Self {
        self.accessibility = accessibility.map(str::to_owned);
        self
    }

    pub fn return_data(mut self, return_data: Option<bool>) -> Self {
        self.return_data = return_data;
        self
    }

    pub fn build(self) -> Query {
        let mut query = Query::new();
        query.insert(Attr::Class, Value::Str(GENERIC_PASSWORD.to_string()));

        if let Some(accessibility) = self.accessibility.as_deref() {
            query.insert(
                Attr::Accessible,
                Value::Protection(policy::resolve_protection(Some(accessibility))),
            );
        }
        if let Some(key) = self.key {
            query.insert(Attr::Account, Value::Str(key));
        }
        if let Some(group_id) = self.group_id {
            query.insert(Attr::AccessGroup, Value::Str(group_id));
        }
        if let Some(account_name) = self.account_name {
            query.insert(Attr::Service, Value::Str(account_name));
        }
        if let Some(synchronizable) = self.synchronizable {
            query.insert(Attr::Synchronizable, Value::Bool(synchronizable));
        }
        if let Some(return_data) = self.return_data {
            query.insert(Attr::ReturnData, Value::Bool(return_data));
        }

        query
    }
}
