//! Route-level guards
//!
//! On denial a route navigates away instead of rendering in place. The
//! navigation happens at most once per session generation, and redirect
//! chains through other guarded routes stop at the first route the session
//! may actually see. A chain that loops back on itself ends in `Blocked`,
//! meaning the caller renders its denial in place.

use crate::rbac::{satisfies, Requirement};
use crate::session::SessionState;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session still loading; do not navigate yet
    Pending,
    Allow,
    Redirect(String),
    /// Denied and no safe redirect exists
    Blocked,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    route: String,
    requirement: Requirement,
    redirect_to: String,
    redirected_at: Option<u64>,
}

impl RouteGuard {
    pub fn new(route: impl Into<String>, requirement: Requirement, redirect_to: impl Into<String>) -> Self {
        RouteGuard {
            route: normalize(&route.into()),
            requirement,
            redirect_to: normalize(&redirect_to.into()),
            redirected_at: None,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn permits(&self, state: &SessionState) -> bool {
        !state.is_loading() && satisfies(state, &self.requirement)
    }

    /// Decide for a visit to this route
    ///
    /// Redirects once per session generation; a repeated denial in the same
    /// generation, or a redirect back onto this route, is `Blocked`.
    pub fn check(&mut self, state: &SessionState) -> Navigation {
        if state.is_loading() {
            return Navigation::Pending;
        }
        if satisfies(state, &self.requirement) {
            return Navigation::Allow;
        }
        if self.redirect_to == self.route {
            warn!(route = %self.route, "route guard redirects to itself");
            return Navigation::Blocked;
        }

        let generation = state.generation();
        if self.redirected_at == Some(generation) {
            return Navigation::Blocked;
        }
        self.redirected_at = Some(generation);
        debug!(route = %self.route, target = %self.redirect_to, "route denied, redirecting");
        Navigation::Redirect(self.redirect_to.clone())
    }
}

/// Set of route guards keyed by path prefix
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    guards: BTreeMap<String, RouteGuard>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, guard: RouteGuard) {
        self.guards.insert(guard.route.clone(), guard);
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Most specific guard covering `path` (`/admin` covers `/admin/users`)
    pub fn guard_for(&self, path: &str) -> Option<&RouteGuard> {
        let path = normalize(path);
        self.guards
            .values()
            .filter(|g| covers(&g.route, &path))
            .max_by_key(|g| g.route.len())
    }

    /// Where a visit to `path` should end up
    ///
    /// Follows redirects while the target is itself denied. Revisiting a
    /// route on the chain ends in `Blocked`.
    pub fn resolve(&self, path: &str, state: &SessionState) -> Navigation {
        if state.is_loading() {
            return Navigation::Pending;
        }

        let start = normalize(path);
        let mut current = start.clone();
        let mut visited = HashSet::new();

        loop {
            let guard = match self.guard_for(&current) {
                Some(guard) if !satisfies(state, &guard.requirement) => guard,
                _ => {
                    return if current == start {
                        Navigation::Allow
                    } else {
                        Navigation::Redirect(current)
                    };
                }
            };

            if !visited.insert(current.clone()) || visited.contains(&guard.redirect_to) {
                warn!(path = %start, at = %current, "redirect cycle between guarded routes");
                return Navigation::Blocked;
            }
            current = guard.redirect_to.clone();
        }
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}
