//! Permission catalog module
//!
//! Permission keys, permissions and roles as issued by the backend.
//! Data only; evaluation lives in `rbac`.

mod key;
mod model;
#[allow(clippy::module_inception)]
mod catalog;

pub use catalog::{PermissionCatalog, CATALOG_KIND};
pub use key::{well_known, PermissionKey};
pub use model::{Permission, Role};

pub(crate) use model::{opt_string_or_number, string_or_number};
