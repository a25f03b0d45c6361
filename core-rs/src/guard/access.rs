//! Access guard for protected regions
//!
//! The guard answers one question per session state: load, show, hide, or
//! deny. What "deny" looks like (notice, redirect) belongs to the call site,
//! which supplies the fallback.

use crate::errors::Result;
use crate::rbac::{satisfies, Requirement};
use crate::session::SessionState;

/// Outcome of evaluating a guard against a session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading; render a neutral placeholder
    Loading,
    Granted,
    /// Denied with `hide_on_denied`; render nothing
    Hidden,
    /// Denied; render the call site's fallback
    Denied,
}

/// Result of [`AccessGuard::render`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Loading,
    Content(T),
    Nothing,
    Fallback(T),
}

impl<T> Rendered<T> {
    pub fn is_content(&self) -> bool {
        matches!(self, Rendered::Content(_))
    }

    /// Content or fallback, whichever was produced
    pub fn into_option(self) -> Option<T> {
        match self {
            Rendered::Content(v) | Rendered::Fallback(v) => Some(v),
            Rendered::Loading | Rendered::Nothing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGuard {
    requirement: Requirement,
    hide_on_denied: bool,
}

impl AccessGuard {
    pub fn new(requirement: Requirement) -> Self {
        AccessGuard {
            requirement,
            hide_on_denied: false,
        }
    }

    /// Guard passing when ANY of `keys` is granted
    pub fn any_of<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Requirement::any_of(keys)?))
    }

    pub fn hide_on_denied(mut self, hide: bool) -> Self {
        self.hide_on_denied = hide;
        self
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn hides_on_denied(&self) -> bool {
        self.hide_on_denied
    }

    /// Plain authorization answer; `false` while loading
    pub fn is_authorized(&self, state: &SessionState) -> bool {
        !state.is_loading() && satisfies(state, &self.requirement)
    }

    pub fn decide(&self, state: &SessionState) -> GuardDecision {
        if state.is_loading() {
            return GuardDecision::Loading;
        }
        if satisfies(state, &self.requirement) {
            GuardDecision::Granted
        } else if self.hide_on_denied {
            GuardDecision::Hidden
        } else {
            GuardDecision::Denied
        }
    }

    /// Produce the protected content or the fallback
    ///
    /// `content` runs only when granted and `fallback` only when denied,
    /// so neither is evaluated while the session is loading.
    pub fn render<T, C, F>(&self, state: &SessionState, content: C, fallback: F) -> Rendered<T>
    where
        C: FnOnce() -> T,
        F: FnOnce() -> T,
    {
        match self.decide(state) {
            GuardDecision::Loading => Rendered::Loading,
            GuardDecision::Granted => Rendered::Content(content()),
            GuardDecision::Hidden => Rendered::Nothing,
            GuardDecision::Denied => Rendered::Fallback(fallback()),
        }
    }

    /// Guard for a region nested inside `self`
    ///
    /// Passes only when both requirements pass; denial presentation follows
    /// the inner guard.
    pub fn nest(&self, inner: &AccessGuard) -> AccessGuard {
        AccessGuard {
            requirement: self.requirement.clone().and(inner.requirement.clone()),
            hide_on_denied: inner.hide_on_denied,
        }
    }
}
