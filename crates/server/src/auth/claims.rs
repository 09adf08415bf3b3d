use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JWT claims we look at. Everything else in the token is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issuer claim - identifies the principal that issued the JWT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience claim - a single string or an array of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,

    /// Subject claim - the caller the session belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl SessionClaims {
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// The non-empty subject claim.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|sub| !sub.is_empty())
    }

    /// Check if the given audience is present in the audience claim
    pub fn has_audience(&self, expected_audience: &str) -> bool {
        match &self.aud {
            Some(Value::String(aud)) => aud == expected_audience,
            Some(Value::Array(auds)) => auds.iter().any(|aud| aud.as_str() == Some(expected_audience)),
            _ => false,
        }
    }
}
