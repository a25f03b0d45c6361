//! Auth service
//!
//! Drives the session store through its lifecycle using the dispatcher:
//! startup restore, sign-in, sign-out and the public password setup call.

use crate::config::{ClientConfig, Endpoints};
use crate::dispatch::{ApiClient, Method};
use crate::errors::{AccessError, Result};
use crate::session::{AuthUser, Session, SessionState, SessionStore, UserProfile};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AuthService {
    client: ApiClient,
    store: Arc<SessionStore>,
    endpoints: Endpoints,
}

impl AuthService {
    pub fn new(client: ApiClient, store: Arc<SessionStore>, endpoints: Endpoints) -> Self {
        AuthService {
            client,
            store,
            endpoints,
        }
    }

    /// Dispatcher and endpoints from config, tokens from `store`
    pub fn from_config(config: &ClientConfig, store: Arc<SessionStore>) -> Result<Self> {
        let client = ApiClient::from_config(config, store.clone())?;
        Ok(Self::new(client, store, config.spec.endpoints.clone()))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Startup: look up the persisted credential and load its profile
    pub async fn restore(&self) -> SessionState {
        match self.store.stored_token() {
            Ok(Some(token)) if !token.is_empty() => {
                let ticket = self.store.begin_load();
                let outcome = self.fetch_session(&token, None).await;
                self.store.complete(ticket, outcome);
            }
            Ok(_) => self.store.mark_unauthenticated(),
            Err(e) => {
                warn!(error = %e, "credential lookup failed");
                self.store.mark_unauthenticated();
            }
        }
        self.store.state()
    }

    /// Exchange credentials for a token, then load the profile
    ///
    /// A rejected login leaves the current session untouched (a store still
    /// in its initial `Loading` state becomes `Unauthenticated`) and returns
    /// the backend error. A profile failure after a successful login lands
    /// the store in `Error`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionState> {
        let ticket = self.store.begin_load();
        let body = json!({ "email": email, "password": password });

        let response = match self
            .client
            .api_call(&self.endpoints.login, Method::POST, Some(&body), false)
            .await
            .and_then(|response| extract_token(&response).map(|token| (token, response)))
        {
            Ok(pair) => pair,
            Err(err) => {
                self.store.abandon(ticket);
                return Err(err);
            }
        };

        let (token, login_response) = response;
        let user = login_response
            .get("user")
            .cloned()
            .and_then(|u| serde_json::from_value::<AuthUser>(u).ok());

        let outcome = self.fetch_session(&token, user).await;
        let applied = self.store.complete(ticket, outcome);
        if !applied {
            info!(email, "sign-in superseded before completion");
        }
        Ok(self.store.state())
    }

    pub fn sign_out(&self) {
        self.store.sign_out();
    }

    /// Set a password from an emailed setup token (no session required)
    pub async fn set_password(&self, setup_token: &str, password: &str) -> Result<JsonValue> {
        let body = json!({ "token": setup_token, "password": password });
        self.client
            .api_call(&self.endpoints.set_password, Method::POST, Some(&body), false)
            .await
    }

    /// Re-fetch the profile for the current credential
    pub async fn refresh_profile(&self) -> Result<SessionState> {
        let token = self
            .store
            .bearer_token()
            .ok_or_else(|| AccessError::AuthenticationMissing("no stored credential".to_string()))?;
        let user = self.store.current_session().map(|s| s.user.clone());

        let ticket = self.store.begin_load();
        let outcome = self.fetch_session(&token, user).await;
        self.store.complete(ticket, outcome);
        Ok(self.store.state())
    }

    async fn fetch_session(&self, token: &str, user: Option<AuthUser>) -> Result<Session> {
        let response = self
            .client
            .api_call_with_token(&self.endpoints.profile, Method::GET, None, token)
            .await?;
        let profile = UserProfile::from_response(response)?;
        let user = user.unwrap_or_else(|| AuthUser::from_profile(&profile));
        Ok(Session::new(user, profile, token))
    }
}

/// Token from a login response: `token`, `accessToken`, `access_token`,
/// at the top level or under `data`
fn extract_token(response: &JsonValue) -> Result<String> {
    const FIELDS: [&str; 3] = ["token", "accessToken", "access_token"];

    let candidates = [Some(response), response.get("data")];
    for scope in candidates.into_iter().flatten() {
        for field in FIELDS {
            if let Some(token) = scope.get(field).and_then(|v| v.as_str()) {
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
        }
    }

    Err(AccessError::MalformedResponse("login response carries no token".to_string()))
}
