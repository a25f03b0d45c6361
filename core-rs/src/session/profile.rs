//! Authenticated identity records

use crate::catalog::{opt_string_or_number, string_or_number, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Profile of the signed-in user as returned by the backend
///
/// Unknown backend fields are preserved in `extra` so callers can read
/// resource-specific data without this crate knowing about it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(
        default,
        rename = "companyId",
        alias = "company_id",
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub company_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        UserProfile {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            role: None,
            company_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Extract a profile from a backend response
    ///
    /// Profile endpoints wrap the record as `{ status, message, user }`,
    /// `{ profile }` or `{ data }`; a bare profile object is accepted too.
    pub fn from_response(value: JsonValue) -> crate::errors::Result<Self> {
        let record = match value {
            JsonValue::Object(mut map) => {
                let field = ["user", "profile", "data"]
                    .into_iter()
                    .find(|f| matches!(map.get(*f), Some(JsonValue::Object(_))));
                match field.and_then(|f| map.remove(f)) {
                    Some(record) => record,
                    None => JsonValue::Object(map),
                }
            }
            other => {
                return Err(crate::errors::AccessError::ProfileLoad(format!(
                    "unexpected profile payload: {}",
                    other
                )))
            }
        };

        serde_json::from_value(record)
            .map_err(|e| crate::errors::AccessError::ProfileLoad(format!("invalid profile: {}", e)))
    }
}

/// Identity established by credential verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn from_profile(profile: &UserProfile) -> Self {
        AuthUser {
            id: profile.id.clone(),
            email: profile.email.clone(),
        }
    }
}

/// A fully loaded authenticated session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: AuthUser,
    pub profile: UserProfile,
    pub token: String,
    pub loaded_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: AuthUser, profile: UserProfile, token: impl Into<String>) -> Self {
        Session {
            user,
            profile,
            token: token.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Session whose identity is taken from the profile itself
    pub fn from_profile(profile: UserProfile, token: impl Into<String>) -> Self {
        Session::new(AuthUser::from_profile(&profile), profile, token)
    }
}
