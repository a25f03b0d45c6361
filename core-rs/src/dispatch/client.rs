//! Authenticated backend dispatcher
//!
//! Every backend request goes through [`ApiClient::api_call`]:
//! - JSON body and `Content-Type: application/json`
//! - Bearer token from the session store (skipped for public endpoints)
//! - Non-2xx responses normalized into one `AccessError::Api`
//! - Success bodies returned as parsed JSON, unshaped
//!
//! No retries. Errors always reach the caller; falling back to an empty
//! list or zeroed summary is the caller's decision.

use super::token::TokenSource;
use crate::config::ClientConfig;
use crate::errors::{AccessError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish()
    }
}

impl ApiClient {
    /// Create a client for one backend base URL
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use wms_access::{ApiClient, SessionStore};
    ///
    /// let store = Arc::new(SessionStore::in_memory());
    /// let client = ApiClient::new("http://localhost:5000/api/", store).unwrap();
    /// assert_eq!(client.build_url("/products"), "http://localhost:5000/api/products");
    /// ```
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Self::with_timeout(base_url, tokens, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(base_url, http, tokens))
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient { http, base_url, tokens }
    }

    pub fn from_config(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Self::with_timeout(config.base_url(), tokens, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}{path}`, inserting the separating slash when missing
    pub fn build_url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else if path.starts_with('/') || path.starts_with('?') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue one backend request
    ///
    /// With `require_auth` the session's bearer token is attached when one
    /// exists; without one the request still goes out and the backend's
    /// 401 comes back as a normal error. A 401 on a request that did carry
    /// a token invalidates the session before the error is returned, unless
    /// that token has since been replaced.
    pub async fn api_call(
        &self,
        path: &str,
        method: Method,
        body: Option<&JsonValue>,
        require_auth: bool,
    ) -> Result<JsonValue> {
        let token = if require_auth {
            let token = self.tokens.bearer_token();
            if token.is_none() {
                debug!(%method, path, "no credential available for authenticated request");
            }
            token
        } else {
            None
        };

        let result = self.send(path, method, body, token.as_deref()).await;
        if let (Err(err), Some(sent)) = (&result, token.as_deref()) {
            if err.is_unauthorized() {
                self.tokens.on_unauthorized(sent);
            }
        }
        result
    }

    /// Issue a request with an explicit token instead of the session's
    ///
    /// Used while establishing a session, when the token being verified is
    /// not yet the session's. Does not touch session state on 401.
    pub async fn api_call_with_token(
        &self,
        path: &str,
        method: Method,
        body: Option<&JsonValue>,
        token: &str,
    ) -> Result<JsonValue> {
        self.send(path, method, body, Some(token)).await
    }

    /// `api_call` decoding the success body into `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<&JsonValue>,
        require_auth: bool,
    ) -> Result<T> {
        let value = self.api_call(path, method, body, require_auth).await?;
        serde_json::from_value(value)
            .map_err(|e| AccessError::MalformedResponse(format!("unexpected response shape from {}: {}", path, e)))
    }

    pub async fn get(&self, path: &str) -> Result<JsonValue> {
        self.api_call(path, Method::GET, None, true).await
    }

    pub async fn post(&self, path: &str, body: &JsonValue) -> Result<JsonValue> {
        self.api_call(path, Method::POST, Some(body), true).await
    }

    pub async fn put(&self, path: &str, body: &JsonValue) -> Result<JsonValue> {
        self.api_call(path, Method::PUT, Some(body), true).await
    }

    pub async fn patch(&self, path: &str, body: &JsonValue) -> Result<JsonValue> {
        self.api_call(path, Method::PATCH, Some(body), true).await
    }

    pub async fn delete(&self, path: &str) -> Result<JsonValue> {
        self.api_call(path, Method::DELETE, None, true).await
    }

    async fn send(&self, path: &str, method: Method, body: Option<&JsonValue>, token: Option<&str>) -> Result<JsonValue> {
        let url = self.build_url(path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, authenticated = token.is_some(), "dispatching backend request");
        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "backend unreachable");
            AccessError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = normalize_error(status, &text);
            warn!(%method, path, status = status.as_u16(), message = %err.message(), "backend request failed");
            return Err(err);
        }

        parse_success(&text).map_err(|e| {
            warn!(%method, path, error = %e, "backend returned non-JSON success body");
            e
        })
    }
}

/// Turn a non-2xx response into one error carrying a readable message
///
/// `{"message": ...}` (or `{"error": "..."}`) when the body is structured,
/// otherwise the raw text, otherwise a generic status message.
pub fn normalize_error(status: StatusCode, body: &str) -> AccessError {
    let structured = match serde_json::from_str::<JsonValue>(body) {
        Ok(JsonValue::Object(map)) => ["message", "error"]
            .iter()
            .find_map(|field| map.get(*field).and_then(|v| v.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty()),
        Ok(JsonValue::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    };

    let message = structured.unwrap_or_else(|| {
        let raw = body.trim();
        if raw.is_empty() {
            format!("Request failed with status {}", status.as_u16())
        } else {
            raw.to_string()
        }
    });

    AccessError::Api {
        status: status.as_u16(),
        message,
    }
}

fn parse_success(body: &str) -> Result<JsonValue> {
    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(body).map_err(|e| AccessError::MalformedResponse(e.to_string()))
}
