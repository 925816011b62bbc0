//! Provider user profiles
//!
//! Google and GitHub return differently shaped payloads. The profile is kept
//! as an open JSON object and passed through verbatim; only the presence of
//! an identifying field is checked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Fields that identify a user. At least one must be present and non-null.
const IDENTIFYING_FIELDS: &[&str] = &["sub", "id", "email", "login"];

/// A user profile as supplied by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Accept a provider payload as a profile
    ///
    /// # Errors
    /// `ProviderResponse` if the payload is not a JSON object or carries no
    /// identifying field
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(fields) => Self::from_map(fields),
            other => Err(AppError::ProviderResponse(format!(
                "profile must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Result<Self, AppError> {
        let profile = Self(fields);
        if profile.identifier().is_none() {
            return Err(AppError::ProviderResponse(
                "profile has no identifying field".to_string(),
            ));
        }
        Ok(profile)
    }

    /// First identifying field present, rendered as a string
    pub fn identifier(&self) -> Option<String> {
        IDENTIFYING_FIELDS.iter().find_map(|key| match self.0.get(*key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    /// Best-effort display name: `name`, then `login`, then `email`
    pub fn display_name(&self) -> Option<&str> {
        ["name", "login", "email"]
            .iter()
            .find_map(|key| {
                self.0
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
            })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
