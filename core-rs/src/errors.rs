//! Error types for the access core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    /// Normalized backend failure. Display is exactly the backend message so
    /// callers can show it verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Authentication required: {0}")]
    AuthenticationMissing(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Profile load error: {0}")]
    ProfileLoad(String),

    #[error("Invalid permission key: {0}")]
    InvalidPermissionKey(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(String),
}

impl AccessError {
    /// Human-readable message without the variant prefix for backend errors.
    pub fn message(&self) -> String {
        match self {
            AccessError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status for backend errors
    pub fn status(&self) -> Option<u16> {
        match self {
            AccessError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<regex::Error> for AccessError {
    fn from(err: regex::Error) -> Self {
        AccessError::RegexError(err.to_string())
    }
}

impl From<reqwest::Error> for AccessError {
    fn from(err: reqwest::Error) -> Self {
        AccessError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
