//! Token source seam between the dispatcher and session state

use crate::session::SessionStore;
use tracing::info;

/// Supplies bearer tokens and hears about rejected ones
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    /// Backend answered 401 to a request carrying `rejected`
    fn on_unauthorized(&self, _rejected: &str) {}
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        SessionStore::bearer_token(self)
    }

    fn on_unauthorized(&self, rejected: &str) {
        if self.invalidate_token(rejected) {
            info!("backend rejected session token");
        }
    }
}

/// Fixed token, for tools that hold a token outside any session
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}
