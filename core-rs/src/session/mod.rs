//! Auth session module
//!
//! Holds the current authenticated identity for the lifetime of a client
//! session, plus the persisted bearer credential.

pub mod credentials;
mod profile;
mod store;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use profile::{AuthUser, Session, UserProfile};
pub use store::{LoadTicket, SessionState, SessionStore, DEFAULT_TOKEN_KEY};
