/**
 * catalog.rs
 * Permission catalog loader (YAML document or backend envelope)
 *
 * Format:
 * ```yaml
 * apiVersion: wms/v1
 * kind: PermissionCatalog
 * spec:
 *   permissions:
 *     - key: can_manage_company
 *       name: Manage company
 *   roles:
 *     - id: 1
 *       name: Company Admin
 *       permissions: [can_manage_company]
 * ```
 */

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::key::PermissionKey;
use super::model::{Permission, Role};
use crate::errors::{AccessError, Result};

pub const CATALOG_KIND: &str = "PermissionCatalog";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    api_version: String,
    kind: String,
    spec: CatalogSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogSpec {
    #[serde(default)]
    permissions: Vec<Permission>,
    #[serde(default)]
    roles: Vec<Role>,
}

/// Backend-defined set of permissions and the roles that bundle them
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    permissions: BTreeMap<PermissionKey, Permission>,
    roles: Vec<Role>,
}

impl PermissionCatalog {
    /// Build a catalog, rejecting duplicate keys
    pub fn new(permissions: Vec<Permission>, roles: Vec<Role>) -> Result<Self> {
        let mut by_key = BTreeMap::new();
        for perm in permissions {
            if !perm.key.follows_convention() {
                warn!(key = %perm.key, "permission key does not follow can_<verb>_<noun>");
            }
            if by_key.contains_key(&perm.key) {
                return Err(AccessError::Catalog(format!("duplicate permission key: {}", perm.key)));
            }
            by_key.insert(perm.key.clone(), perm);
        }

        let catalog = PermissionCatalog { permissions: by_key, roles };
        for role in &catalog.roles {
            let unknown = catalog.validate_role(role);
            if !unknown.is_empty() {
                warn!(
                    role = %role.name,
                    unknown = ?unknown.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
                    "role grants keys missing from catalog"
                );
            }
        }

        debug!(
            permissions = catalog.permissions.len(),
            roles = catalog.roles.len(),
            "permission catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse a YAML catalog document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_yaml::from_str(content)?;
        if doc.kind != CATALOG_KIND {
            return Err(AccessError::Catalog(format!(
                "expected kind '{}', found '{}'",
                CATALOG_KIND, doc.kind
            )));
        }
        Self::new(doc.spec.permissions, doc.spec.roles)
    }

    /// Load a YAML catalog document from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AccessError::Catalog(format!("catalog not found: {}", path.display())));
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Accept a backend response: `{ permissions: [...], roles?: [...] }`
    /// (status/message fields ignored) or a bare permission array.
    pub fn from_backend(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => {
                let permissions: Vec<Permission> = serde_json::from_value(JsonValue::Array(items))?;
                Self::new(permissions, Vec::new())
            }
            JsonValue::Object(mut map) => {
                let permissions = match map.remove("permissions") {
                    Some(v) => serde_json::from_value(v)?,
                    None => {
                        return Err(AccessError::Catalog(
                            "backend response has no 'permissions' field".to_string(),
                        ))
                    }
                };
                let roles = match map.remove("roles") {
                    Some(v) => serde_json::from_value(v)?,
                    None => Vec::new(),
                };
                Self::new(permissions, roles)
            }
            other => Err(AccessError::Catalog(format!(
                "unexpected catalog payload: {}",
                other
            ))),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&Permission> {
        self.permissions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.permissions.contains_key(key)
    }

    /// Resolve a raw key against the catalog, returning the interned key
    pub fn resolve(&self, key: &str) -> Result<PermissionKey> {
        self.permissions
            .get_key_value(key)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| AccessError::Catalog(format!("unknown permission key: {}", key)))
    }

    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Find role by id or (case-insensitive) name
    pub fn role(&self, id_or_name: &str) -> Option<&Role> {
        self.roles
            .iter()
            .find(|r| r.id == id_or_name)
            .or_else(|| self.roles.iter().find(|r| r.name.eq_ignore_ascii_case(id_or_name)))
    }

    pub fn roles_granting(&self, key: &str) -> Vec<&Role> {
        self.roles.iter().filter(|r| r.grants(key)).collect()
    }

    /// Keys granted by `role` that the catalog does not know
    pub fn validate_role(&self, role: &Role) -> Vec<PermissionKey> {
        role.keys()
            .filter(|k| !self.permissions.contains_key(k.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}
