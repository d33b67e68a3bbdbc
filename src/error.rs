//! Error types shared by the remote API seam and the stores.
//!
//! DESIGN
//! ======
//! `ApiError` keeps the raw response body of a rejected call so the auth
//! store can pull a display message out of it without the transport having
//! to know which endpoints carry which error shapes.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use serde_json::Value;

// =============================================================================
// API ERROR
// =============================================================================

/// Errors produced by calls against the remote API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("API request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("API response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status of a rejected call, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Human-readable message from the server's error payload.
    ///
    /// Accepts `{ "message": "..." }` and `{ "message": ["...", "..."] }`;
    /// list entries are joined with `", "`. Returns `None` for transport
    /// failures and bodies without a usable message.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Response { body, .. } => extract_message(body),
            _ => None,
        }
    }
}

pub(crate) fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        _ => None,
    }
}

// =============================================================================
// CONFIG ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid push URL: {0}")]
    InvalidPushUrl(String),
}
