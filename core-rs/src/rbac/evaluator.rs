//! Permission evaluator
//!
//! Pure predicates over the current session. Nothing is cached: every call
//! reads the state it is handed, so a freshly cleared session is denied on
//! the very next check.
//!
//! Conventions:
//! - Missing profile, missing role, or any non-authenticated session state
//!   denies every key (fail-closed).
//! - `has_any_permission(&[])` is `false`.
//! - `has_all_permissions(&[])` is `true` (vacuous truth).

use super::requirement::Requirement;
use crate::catalog::{well_known, PermissionKey};
use crate::session::{Session, SessionState, UserProfile};
use std::sync::Arc;

/// Anything a permission decision can be made about
pub trait Subject {
    /// Profile to evaluate, or `None` when there is no authenticated identity
    fn profile(&self) -> Option<&UserProfile>;
}

impl Subject for UserProfile {
    fn profile(&self) -> Option<&UserProfile> {
        Some(self)
    }
}

impl Subject for Session {
    fn profile(&self) -> Option<&UserProfile> {
        Some(&self.profile)
    }
}

impl Subject for SessionState {
    fn profile(&self) -> Option<&UserProfile> {
        self.session().map(|s| &s.profile)
    }
}

impl<T: Subject> Subject for Option<T> {
    fn profile(&self) -> Option<&UserProfile> {
        self.as_ref().and_then(|s| s.profile())
    }
}

impl<T: Subject + ?Sized> Subject for Arc<T> {
    fn profile(&self) -> Option<&UserProfile> {
        (**self).profile()
    }
}

impl<T: Subject + ?Sized> Subject for &T {
    fn profile(&self) -> Option<&UserProfile> {
        (**self).profile()
    }
}

/// True iff `key` is granted by the subject's role
///
/// # Example
///
/// ```
/// use wms_access::rbac::has_permission;
/// use wms_access::{Permission, PermissionKey, Role, UserProfile};
///
/// let key = PermissionKey::new("can_view_customers_menu").unwrap();
/// let role = Role::new("2", "Sales", vec![Permission::new(key, "Customers")]);
/// let profile = UserProfile::new("1", "Ada", "Obi").with_role(role);
///
/// assert!(has_permission(&profile, "can_view_customers_menu"));
/// assert!(!has_permission(&profile, "can_manage_system"));
/// ```
pub fn has_permission<S: Subject + ?Sized>(subject: &S, key: &str) -> bool {
    subject
        .profile()
        .and_then(|p| p.role.as_ref())
        .map(|role| role.grants(key))
        .unwrap_or(false)
}

/// True if at least one key is granted; empty slice is `false`
pub fn has_any_permission<S, K>(subject: &S, keys: &[K]) -> bool
where
    S: Subject + ?Sized,
    K: AsRef<str>,
{
    for key in keys {
        if has_permission(subject, key.as_ref()) {
            return true;
        }
    }
    false
}

/// True if every key is granted; empty slice is `true`
pub fn has_all_permissions<S, K>(subject: &S, keys: &[K]) -> bool
where
    S: Subject + ?Sized,
    K: AsRef<str>,
{
    for key in keys {
        if !has_permission(subject, key.as_ref()) {
            return false;
        }
    }
    true
}

pub fn is_system_admin<S: Subject + ?Sized>(subject: &S) -> bool {
    has_permission(subject, well_known::CAN_MANAGE_SYSTEM)
}

pub fn is_company_admin<S: Subject + ?Sized>(subject: &S) -> bool {
    has_permission(subject, well_known::CAN_MANAGE_COMPANY)
}

pub fn is_admin<S: Subject + ?Sized>(subject: &S) -> bool {
    is_system_admin(subject) || is_company_admin(subject)
}

/// Evaluate a requirement tree
///
/// Follows the slice conventions: `AnyOf([])` is `false`, `AllOf([])` is `true`.
pub fn satisfies<S: Subject + ?Sized>(subject: &S, requirement: &Requirement) -> bool {
    match requirement {
        Requirement::Key(key) => has_permission(subject, key.as_str()),
        Requirement::AnyOf(keys) => has_any_permission(subject, keys.as_slice()),
        Requirement::AllOf(parts) => parts.iter().all(|part| satisfies(subject, part)),
    }
}

/// Keys the subject holds, in role order
pub fn granted_keys<S: Subject + ?Sized>(subject: &S) -> Vec<&PermissionKey> {
    subject
        .profile()
        .and_then(|p| p.role.as_ref())
        .map(|role| role.keys().collect())
        .unwrap_or_default()
}
