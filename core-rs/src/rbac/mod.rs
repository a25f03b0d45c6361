//! RBAC (Role-Based Access Control) module
//!
//! Provides permission evaluation over the current session and the
//! requirement type call sites use to describe what they need.

pub mod evaluator;
pub mod requirement;

pub use evaluator::{
    granted_keys, has_all_permissions, has_any_permission, has_permission, is_admin, is_company_admin,
    is_system_admin, satisfies, Subject,
};
pub use requirement::Requirement;
