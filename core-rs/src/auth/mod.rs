//! Auth module
//!
//! Session lifecycle against the backend's auth endpoints.

mod service;

pub use service::AuthService;
