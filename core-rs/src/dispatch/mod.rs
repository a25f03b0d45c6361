//! Dispatch module - the single chokepoint for backend requests
//!
//! - ApiClient: authenticated request dispatch and error normalization
//! - TokenSource: where bearer tokens come from (the session store)

mod client;
mod token;

pub use client::{normalize_error, ApiClient};
pub use reqwest::Method;
pub use token::{StaticToken, TokenSource};
