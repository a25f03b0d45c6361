//! # WMS Access - warehouse management access core
//!
//! Permission evaluation, session lifecycle and authenticated backend
//! dispatch for the warehouse/ERP client. Every page and route handler of
//! the application sits on top of these pieces.
//!
//! ## Core Principle
//!
//! **Fail closed**: no profile, no role, a loading session or a failed
//! profile fetch all deny every permission.
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────┐   profile    ┌──────────────┐   bool   ┌──────────────┐
//!  │ SessionStore │ ───────────▶ │  rbac (eval) │ ───────▶ │ AccessGuard  │
//!  └──────┬───────┘              └──────────────┘          └──────────────┘
//!         │ bearer token
//!         ▼
//!  ┌──────────────┐   METHOD {base}{path}   ┌──────────────┐
//!  │  ApiClient   │ ──────────────────────▶ │   backend    │
//!  └──────────────┘                         └──────────────┘
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod guard;
pub mod rbac;
pub mod session;

pub use auth::AuthService;
pub use catalog::{well_known, Permission, PermissionCatalog, PermissionKey, Role};
pub use config::ClientConfig;
pub use dispatch::{ApiClient, Method, StaticToken, TokenSource};
pub use errors::AccessError;
pub use guard::{AccessGuard, GuardDecision, Navigation, Rendered, RouteGuard, RouteTable};
pub use rbac::{Requirement, Subject};
pub use session::{
    AuthUser, CredentialStore, FileCredentialStore, LoadTicket, MemoryCredentialStore, Session, SessionState,
    SessionStore, UserProfile,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
