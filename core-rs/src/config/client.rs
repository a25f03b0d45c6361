/**
 * client.rs
 * Parser for wms.yaml client configuration (YAML format)
 *
 * Format:
 * ```yaml
 * apiVersion: wms/v1
 * kind: Client
 * spec:
 *   backend:
 *     baseUrl: https://api.example.com/api
 *     timeoutSecs: 30
 *   credentials:
 *     storageKey: token
 *     path: /home/me/.wms/credentials.json
 *   endpoints:
 *     login: /auth/login
 *     profile: /auth/me
 *     setPassword: /auth/set-password
 * ```
 *
 * Environment overrides: WMS_API_BASE_URL, WMS_CREDENTIALS_PATH
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::AccessError;
use crate::session::DEFAULT_TOKEN_KEY;

pub const API_VERSION: &str = "wms/v1";
pub const CLIENT_KIND: &str = "Client";
pub const ENV_BASE_URL: &str = "WMS_API_BASE_URL";
pub const ENV_CREDENTIALS_PATH: &str = "WMS_CREDENTIALS_PATH";
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// wms.yaml file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub spec: ClientSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientSpec {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Backend REST API location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where the bearer token is persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// File-backed storage when set, in-memory otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        CredentialsConfig {
            storage_key: default_storage_key(),
            path: None,
        }
    }
}

/// Auth endpoint paths relative to the base URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_set_password")]
    pub set_password: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            login: default_login(),
            profile: default_profile(),
            set_password: default_set_password(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_storage_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}

fn default_login() -> String {
    "/auth/login".to_string()
}

fn default_profile() -> String {
    "/auth/me".to_string()
}

fn default_set_password() -> String {
    "/auth/set-password".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_version: API_VERSION.to_string(),
            kind: CLIENT_KIND.to_string(),
            spec: ClientSpec::default(),
        }
    }
}

impl ClientConfig {
    /// Load wms.yaml from specified path, applying environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AccessError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AccessError::Config(format!("config not found: {}", path.display())));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AccessError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise defaults; env overrides apply to both
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AccessError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, AccessError> {
        serde_yaml::from_str(content).map_err(|e| AccessError::Config(format!("Invalid client config YAML: {}", e)))
    }

    /// Override from WMS_API_BASE_URL / WMS_CREDENTIALS_PATH when set
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_CREDENTIALS_PATH).ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, credentials_path: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.spec.backend.base_url = url.trim().to_string();
        }
        if let Some(path) = credentials_path.filter(|p| !p.trim().is_empty()) {
            self.spec.credentials.path = Some(PathBuf::from(path.trim()));
        }
    }

    /// Validate structure
    ///
    /// Ensures:
    /// - apiVersion is "wms/v1" and kind is "Client"
    /// - base URL is http(s)
    /// - request timeout is non-zero
    /// - storage key and endpoint paths are non-empty
    pub fn validate(&self) -> Result<(), AccessError> {
        if self.api_version != API_VERSION {
            return Err(AccessError::ValidationError(format!(
                "Invalid apiVersion: expected '{}', got '{}'",
                API_VERSION, self.api_version
            )));
        }

        if self.kind != CLIENT_KIND {
            return Err(AccessError::ValidationError(format!(
                "Invalid kind: expected '{}', got '{}'",
                CLIENT_KIND, self.kind
            )));
        }

        let url = &self.spec.backend.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AccessError::ValidationError(format!(
                "spec.backend.baseUrl must be an http(s) URL, got '{}'",
                url
            )));
        }

        if self.spec.backend.timeout_secs == 0 {
            return Err(AccessError::ValidationError(
                "spec.backend.timeoutSecs must be greater than 0".to_string(),
            ));
        }

        if self.spec.credentials.storage_key.is_empty() {
            return Err(AccessError::ValidationError(
                "spec.credentials.storageKey cannot be empty".to_string(),
            ));
        }

        for (name, path) in [
            ("login", &self.spec.endpoints.login),
            ("profile", &self.spec.endpoints.profile),
            ("setPassword", &self.spec.endpoints.set_password),
        ] {
            if !path.starts_with('/') {
                return Err(AccessError::ValidationError(format!(
                    "spec.endpoints.{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }

        Ok(())
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.spec.backend.base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.spec.backend.timeout_secs)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AccessError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)?;
        Ok(())
    }
}
