//! Interned permission keys
//!
//! Keys are opaque to the client. They are validated once at the boundary
//! where they enter the process (catalog load, profile deserialization) and
//! interned so repeated keys share one allocation.

use crate::errors::{AccessError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

static INTERNER: Lazy<Mutex<HashSet<Arc<str>>>> = Lazy::new(|| Mutex::new(HashSet::new()));

static NAMING_CONVENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^can_[a-z0-9]+(_[a-z0-9]+)+$").expect("static pattern compiles"));

/// Identifier of a single grantable capability (e.g. `can_manage_company`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionKey(Arc<str>);

impl PermissionKey {
    /// Validate and intern a key
    ///
    /// Rejects empty keys and keys containing whitespace or control
    /// characters. Naming convention is not enforced here; see
    /// [`PermissionKey::follows_convention`].
    ///
    /// # Example
    ///
    /// ```
    /// use wms_access::PermissionKey;
    ///
    /// let key = PermissionKey::new("can_view_customers_menu").unwrap();
    /// assert_eq!(key.as_str(), "can_view_customers_menu");
    /// assert!(PermissionKey::new("  ").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(AccessError::InvalidPermissionKey("key cannot be empty".to_string()));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AccessError::InvalidPermissionKey(format!(
                "key '{}' contains whitespace or control characters",
                raw.escape_debug()
            )));
        }

        let mut interner = INTERNER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = interner.get(raw) {
            return Ok(PermissionKey(existing.clone()));
        }
        let interned: Arc<str> = Arc::from(raw);
        interner.insert(interned.clone());
        Ok(PermissionKey(interned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key follows `can_<verb>_<noun>`
    pub fn follows_convention(&self) -> bool {
        NAMING_CONVENTION.is_match(&self.0)
    }

    /// Cheap identity check for interned keys
    pub fn ptr_eq(&self, other: &PermissionKey) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionKey({})", self.0)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PermissionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PermissionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PermissionKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for PermissionKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl TryFrom<&str> for PermissionKey {
    type Error = AccessError;

    fn try_from(value: &str) -> Result<Self> {
        PermissionKey::new(value)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self> {
        PermissionKey::new(&value)
    }
}

impl Serialize for PermissionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PermissionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PermissionKey::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Keys consumed directly by application call sites
pub mod well_known {
    pub const CAN_ACCESS_ADMIN_PORTAL: &str = "can_access_admin_portal";
    pub const CAN_MANAGE_SYSTEM: &str = "can_manage_system";
    pub const CAN_MANAGE_COMPANY: &str = "can_manage_company";
    pub const CAN_VIEW_ANALYTICS_DASHBOARD_MENU: &str = "can_view_analytics_dashboard_menu";
    pub const CAN_EXPORT_ANALYTICS_DATA: &str = "can_export_analytics_data";
    pub const CAN_VIEW_SERIAL_NUMBERS_MENU: &str = "can_view_serial_numbers_menu";
    pub const CAN_VIEW_CUSTOMERS_MENU: &str = "can_view_customers_menu";

    pub const ALL: &[&str] = &[
        CAN_ACCESS_ADMIN_PORTAL,
        CAN_MANAGE_SYSTEM,
        CAN_MANAGE_COMPANY,
        CAN_VIEW_ANALYTICS_DASHBOARD_MENU,
        CAN_EXPORT_ANALYTICS_DATA,
        CAN_VIEW_SERIAL_NUMBERS_MENU,
        CAN_VIEW_CUSTOMERS_MENU,
    ];
}
