//! Apple Security framework vault.
//!
//! Queries are marshaled into a CoreFoundation dictionary keyed by the
//! native attribute constants and handed to `SecItemCopyMatching`,
//! `SecItemAdd` and `SecItemDelete`. Status codes come back verbatim.

use std::ffi::c_void;
use std::ptr;

use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::data::CFData;
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::CFString;
use security_framework::access_control::{ProtectionMode, SecAccessControl};
use security_framework_sys::keychain_item::{SecItemAdd, SecItemCopyMatching, SecItemDelete};
use tracing::debug;

use super::{Item, Vault};
use crate::access_control::{AccessControl, AccessControlFlags};
use crate::policy::ProtectionClass;
use crate::query::{Attr, Query, Value};
use crate::status::Status;

/// Vault backed by the system keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeychainVault;

impl KeychainVault {
    pub fn new() -> Self {
        Self
    }
}

fn protection_mode(protection: ProtectionClass) -> ProtectionMode {
    match protection {
        ProtectionClass::WhenPasscodeSetThisDeviceOnly => {
            ProtectionMode::AccessibleWhenPasscodeSetThisDeviceOnly
        }
        ProtectionClass::WhenUnlocked => ProtectionMode::AccessibleWhenUnlocked,
        ProtectionClass::WhenUnlockedThisDeviceOnly => {
            ProtectionMode::AccessibleWhenUnlockedThisDeviceOnly
        }
        ProtectionClass::AfterFirstUnlock => ProtectionMode::AccessibleAfterFirstUnlock,
        ProtectionClass::AfterFirstUnlockThisDeviceOnly => {
            ProtectionMode::AccessibleAfterFirstUnlockThisDeviceOnly
        }
    }
}

fn native_access_control(access_control: &AccessControl) -> Result<SecAccessControl, Status> {
    SecAccessControl::create_with_protection(
        Some(protection_mode(access_control.protection)),
        access_control.flags.bits() as _,
    )
    .map_err(|e| Status::from_code(e.code()))
}

fn to_cf_value(value: &Value) -> Result<CFType, Status> {
    Ok(match value {
        Value::Str(s) => CFString::new(s).as_CFType(),
        Value::Bool(b) => CFBoolean::from(*b).as_CFType(),
        Value::Data(d) => CFData::from_buffer(d).as_CFType(),
        Value::Protection(p) => CFString::from_static_string(p.token()).as_CFType(),
        Value::AccessControl(ac) => native_access_control(ac)?.as_CFType(),
        Value::Limit(l) => CFString::from_static_string(l.token()).as_CFType(),
    })
}

fn to_dictionary(query: &Query) -> Result<CFDictionary<CFString, CFType>, Status> {
    let pairs = query
        .iter()
        .map(|(attr, value)| Ok((CFString::from_static_string(attr.token()), to_cf_value(value)?)))
        .collect::<Result<Vec<_>, Status>>()?;
    Ok(CFDictionary::from_CFType_pairs(&pairs))
}

fn status(code: i32) -> Status {
    Status::from_code(code)
}

/// Look up `attr` in an untyped result dictionary.
fn lookup(dict: &CFDictionary, attr: Attr) -> Option<CFType> {
    let key = CFString::from_static_string(attr.token());
    dict.find(key.as_concrete_TypeRef() as *const c_void)
        .map(|value| unsafe { CFType::wrap_under_get_rule(*value) })
}

fn item_from_dictionary(dict: &CFDictionary) -> Item {
    Item {
        account: lookup(dict, Attr::Account)
            .and_then(|v| v.downcast::<CFString>())
            .map(|s| s.to_string()),
        data: lookup(dict, Attr::ValueData)
            .and_then(|v| v.downcast::<CFData>())
            .map(|d| d.bytes().to_vec()),
    }
}

fn parse_result(result: CFType) -> Vec<Item> {
    if let Some(data) = result.downcast::<CFData>() {
        return vec![Item {
            account: None,
            data: Some(data.bytes().to_vec()),
        }];
    }
    if let Some(dict) = result.downcast::<CFDictionary>() {
        return vec![item_from_dictionary(&dict)];
    }
    if let Some(array) = result.downcast::<CFArray>() {
        return array
            .iter()
            .map(|element| unsafe { CFType::wrap_under_get_rule(*element) })
            .filter_map(|element| element.downcast::<CFDictionary>())
            .map(|dict| item_from_dictionary(&dict))
            .collect();
    }
    vec![Item::default()]
}

impl Vault for KeychainVault {
    fn create_access_control(
        &self,
        protection: ProtectionClass,
        flags: AccessControlFlags,
    ) -> Result<AccessControl, Status> {
        let access_control = AccessControl::new(protection, flags);
        native_access_control(&access_control)?;
        Ok(access_control)
    }

    fn copy_matching(&self, query: &Query) -> Result<Vec<Item>, Status> {
        let dictionary = to_dictionary(query)?;
        let mut result = ptr::null();
        let code = unsafe { SecItemCopyMatching(dictionary.as_concrete_TypeRef(), &mut result) };
        debug!(code, "SecItemCopyMatching");
        if code != 0 {
            return Err(status(code));
        }
        if result.is_null() {
            return Ok(vec![Item::default()]);
        }
        let result = unsafe { CFType::wrap_under_create_rule(result) };
        Ok(parse_result(result))
    }

    fn add(&self, query: &Query) -> Status {
        let dictionary = match to_dictionary(query) {
            Ok(dictionary) => dictionary,
            Err(status) => return status,
        };
        let code = unsafe { SecItemAdd(dictionary.as_concrete_TypeRef(), ptr::null_mut()) };
        debug!(code, "SecItemAdd");
        status(code)
    }

    fn delete(&self, query: &Query) -> Status {
        let dictionary = match to_dictionary(query) {
            Ok(dictionary) => dictionary,
            Err(status) => return status,
        };
        let code = unsafe { SecItemDelete(dictionary.as_concrete_TypeRef()) };
        debug!(code, "SecItemDelete");
        status(code)
    }
}
