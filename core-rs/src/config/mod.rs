/**
 * config module
 * Client configuration (backend location, credential storage, auth endpoints)
 */

pub mod client;

pub use client::{BackendConfig, ClientConfig, ClientSpec, CredentialsConfig, Endpoints};
