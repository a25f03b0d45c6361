//! Auth session store
//!
//! Single owned container for the current authenticated identity.
//!
//! ```text
//!            credential + profile ok
//!  Loading ───────────────────────────▶ Authenticated
//!     │                                     │
//!     │ no credential / rejected            │ sign-out / 401
//!     ▼                                     ▼
//!  Unauthenticated ◀────────────────────────┘
//!
//!  Loading ── profile fetch failed ──▶ Error  (denied like Unauthenticated)
//! ```
//!
//! Every mutation bumps a generation counter. Async profile fetches capture
//! the generation in a [`LoadTicket`] and are dropped on completion if the
//! store has moved on (e.g. sign-out happened while the fetch was in flight).

use super::credentials::{CredentialStore, MemoryCredentialStore};
use super::profile::Session;
use crate::errors::{AccessError, Result};
use once_cell::sync::OnceCell;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Storage key the bearer token is persisted under
pub const DEFAULT_TOKEN_KEY: &str = "token";

static GLOBAL_SESSION_STORE: OnceCell<Arc<SessionStore>> = OnceCell::new();

/// Session lifecycle state, tagged with the generation that produced it
#[derive(Debug, Clone)]
pub enum SessionState {
    Loading { generation: u64 },
    Authenticated { generation: u64, session: Arc<Session> },
    Unauthenticated { generation: u64 },
    Error { generation: u64, cause: String },
}

impl SessionState {
    pub fn generation(&self) -> u64 {
        match self {
            SessionState::Loading { generation }
            | SessionState::Authenticated { generation, .. }
            | SessionState::Unauthenticated { generation }
            | SessionState::Error { generation, .. } => *generation,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }

    pub fn has_user(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    /// The live session; `None` in every other state (fail-closed)
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::Error { cause, .. } => Some(cause),
            _ => None,
        }
    }

    fn with_generation(&self, generation: u64) -> SessionState {
        match self {
            SessionState::Loading { .. } => SessionState::Loading { generation },
            SessionState::Authenticated { session, .. } => SessionState::Authenticated {
                generation,
                session: session.clone(),
            },
            SessionState::Unauthenticated { .. } => SessionState::Unauthenticated { generation },
            SessionState::Error { cause, .. } => SessionState::Error {
                generation,
                cause: cause.clone(),
            },
        }
    }
}

/// Handle for one async profile load; only applies while still current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct SessionStore {
    state: RwLock<SessionState>,
    credentials: Box<dyn CredentialStore>,
    token_key: String,
    changes: watch::Sender<SessionState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.read())
            .field("token_key", &self.token_key)
            .finish()
    }
}

impl SessionStore {
    /// Create a store in the initial `Loading` state
    pub fn new(credentials: Box<dyn CredentialStore>) -> Self {
        let initial = SessionState::Loading { generation: 0 };
        let (changes, _) = watch::channel(initial.clone());
        SessionStore {
            state: RwLock::new(initial),
            credentials,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            changes,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCredentialStore::new()))
    }

    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Process-wide store; created in-memory on first use unless
    /// [`SessionStore::install_global`] ran first.
    pub fn global() -> Arc<SessionStore> {
        GLOBAL_SESSION_STORE
            .get_or_init(|| Arc::new(SessionStore::in_memory()))
            .clone()
    }

    /// Install the process-wide store (e.g. one backed by a credential file)
    pub fn install_global(store: Arc<SessionStore>) -> Result<()> {
        GLOBAL_SESSION_STORE
            .set(store)
            .map_err(|_| AccessError::ValidationError("global session store already initialized".to_string()))
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.read().generation()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading()
    }

    pub fn has_user(&self) -> bool {
        self.read().has_user()
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        match &*self.read() {
            SessionState::Authenticated { session, .. } => Some(session.clone()),
            _ => None,
        }
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.changes.subscribe()
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    /// Claim a new generation for an async profile load
    ///
    /// Any earlier outstanding ticket becomes stale, so of several
    /// overlapping sign-in attempts only the most recently started applies.
    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.write();
        let generation = state.generation() + 1;
        *state = state.with_generation(generation);
        let snapshot = state.clone();
        drop(state);

        self.changes.send_replace(snapshot);
        debug!(generation, "session load started");
        LoadTicket { generation }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation() == ticket.generation
    }

    /// Apply the outcome of a profile load
    ///
    /// Returns `false` (and changes nothing) when the ticket is stale.
    /// An applied session has its token persisted, so a restart can restore it.
    /// A 401 from the backend means the credential was rejected and lands in
    /// `Unauthenticated`; any other failure lands in `Error`.
    pub fn complete(&self, ticket: LoadTicket, outcome: Result<Session>) -> bool {
        let mut state = self.write();
        let current = state.generation();
        if current != ticket.generation {
            debug!(
                ticket = ticket.generation,
                current, "discarding stale session load"
            );
            return false;
        }

        let generation = current + 1;
        *state = match outcome {
            Ok(session) => {
                if let Err(e) = self.credentials.set(&self.token_key, &session.token) {
                    warn!(error = %e, "failed to persist session credential");
                }
                info!(user = %session.user.id, generation, "session authenticated");
                SessionState::Authenticated {
                    generation,
                    session: Arc::new(session),
                }
            }
            Err(err) if err.is_unauthorized() => {
                warn!(generation, error = %err, "credential rejected by backend");
                self.clear_token();
                SessionState::Unauthenticated { generation }
            }
            Err(err) => {
                warn!(generation, error = %err, "profile load failed");
                SessionState::Error {
                    generation,
                    cause: err.message(),
                }
            }
        };
        let snapshot = state.clone();
        drop(state);

        self.changes.send_replace(snapshot);
        true
    }

    /// Give up on a load that produced no session (e.g. a rejected login)
    ///
    /// Only a store still `Loading` under `ticket` moves to
    /// `Unauthenticated`; a newer load or an existing session is left alone.
    pub fn abandon(&self, ticket: LoadTicket) -> bool {
        let mut state = self.write();
        if state.generation() != ticket.generation || !state.is_loading() {
            return false;
        }
        let generation = ticket.generation + 1;
        *state = SessionState::Unauthenticated { generation };
        let snapshot = state.clone();
        drop(state);

        info!(generation, "session load abandoned");
        self.changes.send_replace(snapshot);
        true
    }

    /// Run `fetch` under a fresh ticket and apply its result
    pub async fn load_with<F, Fut>(&self, fetch: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session>>,
    {
        let ticket = self.begin_load();
        let outcome = fetch().await;
        self.complete(ticket, outcome)
    }

    /// No credential found at startup
    pub fn mark_unauthenticated(&self) {
        let state = self.write();
        self.transition_unauthenticated(state, false, "no credential");
    }

    /// Explicit sign-out: forget the session and the persisted token
    pub fn sign_out(&self) {
        let state = self.write();
        self.transition_unauthenticated(state, true, "signed out");
    }

    /// Token invalidated or expired
    pub fn invalidate(&self) {
        let state = self.write();
        self.transition_unauthenticated(state, true, "token invalidated");
    }

    /// Invalidate only if `rejected` is still the live credential
    ///
    /// A 401 can arrive after the session it was sent under is gone; it must
    /// not clear a newer session or its persisted token.
    pub fn invalidate_token(&self, rejected: &str) -> bool {
        let state = self.write();
        let live = match state.session() {
            Some(session) => Some(session.token.clone()),
            None => self.stored_token().ok().flatten(),
        };
        if live.as_deref() != Some(rejected) {
            debug!(generation = state.generation(), "ignoring 401 for a superseded credential");
            return false;
        }
        self.transition_unauthenticated(state, true, "token invalidated");
        true
    }

    pub fn persist_token(&self, token: &str) -> Result<()> {
        self.credentials.set(&self.token_key, token)
    }

    pub fn stored_token(&self) -> Result<Option<String>> {
        self.credentials.get(&self.token_key)
    }

    /// Token to attach to backend requests
    ///
    /// The live session's token when authenticated, otherwise the persisted
    /// credential (the profile fetch itself runs before authentication).
    pub fn bearer_token(&self) -> Option<String> {
        if let Some(session) = self.current_session() {
            return Some(session.token.clone());
        }
        match self.stored_token() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "failed to read stored credential");
                None
            }
        }
    }

    /// Move to `Unauthenticated` under an already-held write guard
    ///
    /// The credential is removed inside the same critical section as the
    /// generation bump, so no `complete` can persist a token in between.
    fn transition_unauthenticated(&self, mut state: RwLockWriteGuard<'_, SessionState>, clear_token: bool, reason: &str) {
        if clear_token {
            self.clear_token();
        }
        let generation = state.generation() + 1;
        *state = SessionState::Unauthenticated { generation };
        let snapshot = state.clone();
        drop(state);

        info!(generation, reason, "session cleared");
        self.changes.send_replace(snapshot);
    }

    fn clear_token(&self) {
        if let Err(e) = self.credentials.remove(&self.token_key) {
            warn!(error = %e, "failed to clear stored credential");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
