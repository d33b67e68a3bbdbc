//! Wire DTOs for the auth and notification endpoints.
//!
//! DESIGN
//! ======
//! Field names follow the server's camelCase JSON. Notification payload
//! fields beyond `id`/`isRead` are carried through untouched so the cache
//! never has to understand them.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// AUTH
// =============================================================================

/// The authenticated user's profile as returned by `/auth/me` and login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Successful login/register response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Refresh response. `refresh_token` is present only when the server rotates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// A single feed entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub message: String,
    /// Server-side category (`"info"`, `"alert"`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Any other fields the server sends.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    /// Build an unread notification with only a message. Mostly useful for
    /// local/push delivery and tests.
    #[must_use]
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_read: false,
            message: message.into(),
            kind: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn read(mut self) -> Self {
        self.is_read = true;
        self
    }
}

/// `GET /notifications` answers either with a bare list or an envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedResponse {
    Bare(Vec<Notification>),
    Envelope { data: Vec<Notification> },
}

impl FeedResponse {
    #[must_use]
    pub fn into_items(self) -> Vec<Notification> {
        match self {
            Self::Bare(items) | Self::Envelope { data: items } => items,
        }
    }
}

// =============================================================================
// IDS
// =============================================================================

/// Ids are opaque strings locally, but some backends send integer keys.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(number) if number.is_i64() || number.is_u64() => Ok(number.to_string()),
        Value::Number(number) => Err(D::Error::custom(format!("id {number} is not an integer"))),
        other => Err(D::Error::custom(format!("expected string or integer id, got {other}"))),
    }
}
