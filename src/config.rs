//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_TOKEN_FILE: &str = ".session-sync.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL the endpoint paths (`/auth/login`, ...) are appended to.
    pub api_url: String,
    /// Websocket URL for pushed notifications, if the server offers one.
    pub push_url: Option<String>,
    /// Where the CLI persists the token pair between runs.
    pub token_file: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            push_url: None,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SESSION_SYNC_API_URL`: default `http://127.0.0.1:3000/api`
    /// - `SESSION_SYNC_PUSH_URL`: websocket feed, disabled when absent
    /// - `SESSION_SYNC_TOKEN_FILE`: default `.session-sync.json`
    /// - `SESSION_SYNC_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SESSION_SYNC_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a URL has the wrong scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_api_url(std::env::var("SESSION_SYNC_API_URL").ok().as_deref())?;
        let push_url = parse_push_url(std::env::var("SESSION_SYNC_PUSH_URL").ok().as_deref())?;
        let token_file = std::env::var("SESSION_SYNC_TOKEN_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("SESSION_SYNC_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("SESSION_SYNC_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, push_url, token_file, timeouts })
    }

    /// Replace the API URL, validating it the same way `from_env` does.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for non-http(s) URLs.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(Some(raw))?;
        Ok(self)
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    parse_u64_or(std::env::var(key).ok().as_deref(), default)
}

fn parse_u64_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn parse_api_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_API_URL).trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(url.to_owned()))
    }
}

fn parse_push_url(raw: Option<&str>) -> Result<Option<String>, ConfigError> {
    let Some(url) = raw.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(Some(url.to_owned()))
    } else {
        Err(ConfigError::InvalidPushUrl(url.to_owned()))
    }
}
