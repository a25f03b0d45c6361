//! Permission and role records as issued by the backend

use super::key::PermissionKey;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// A single grantable capability
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Permission {
    pub key: PermissionKey,
    pub name: String,
}

impl Permission {
    pub fn new(key: PermissionKey, name: impl Into<String>) -> Self {
        Permission { key, name: name.into() }
    }
}

// Some endpoints return bare key strings instead of `{ key, name }` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionRepr {
    Full {
        key: PermissionKey,
        #[serde(default)]
        name: Option<String>,
    },
    Key(PermissionKey),
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match PermissionRepr::deserialize(deserializer)? {
            PermissionRepr::Full { key, name } => {
                let name = name.unwrap_or_else(|| key.to_string());
                Permission { key, name }
            }
            PermissionRepr::Key(key) => Permission { name: key.to_string(), key },
        })
    }
}

/// Named bundle of permissions; its list is the authoritative grant set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_permissions")]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Role {
            id: id.into(),
            name: name.into(),
            permissions,
        }
    }

    pub fn grants(&self, key: &str) -> bool {
        self.permissions.iter().any(|p| p.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.permissions.iter().map(|p| &p.key)
    }
}

// Grant lists skip malformed keys instead of failing the role (and with it
// the whole profile, which would lock the user out of every key).
fn lenient_permissions<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<Permission>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawGrant {
        Full {
            key: String,
            #[serde(default)]
            name: Option<String>,
        },
        Key(String),
    }

    let raw = Vec::<RawGrant>::deserialize(deserializer)?;
    let mut permissions = Vec::with_capacity(raw.len());
    for grant in raw {
        let (key, name) = match grant {
            RawGrant::Full { key, name } => (key, name),
            RawGrant::Key(key) => (key, None),
        };
        match PermissionKey::new(&key) {
            Ok(parsed) => {
                let name = name.unwrap_or_else(|| key.clone());
                permissions.push(Permission::new(parsed, name));
            }
            Err(e) => warn!(key = %key.escape_debug(), error = %e, "skipping malformed role grant"),
        }
    }
    Ok(permissions)
}

/// Backend ids arrive as either JSON numbers or strings
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    })
}

pub(crate) fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Option::<Id>::deserialize(deserializer)? {
        Some(Id::Str(s)) => Some(s),
        Some(Id::Int(n)) => Some(n.to_string()),
        Some(Id::Uint(n)) => Some(n.to_string()),
        None => None,
    })
}
