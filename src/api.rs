//! Remote API seam: endpoint traits and the `reqwest` implementation.
//!
//! DESIGN
//! ======
//! Stores depend on `AuthApi`/`NotificationApi` rather than on HTTP so tests
//! can script server behaviour. `HttpApi` implements both against a single
//! base URL and attaches the stored access token as a bearer credential on
//! every request that has one.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::HttpTimeouts;
use crate::error::ApiError;
use crate::token_store::TokenStore;
use crate::types::{AuthResponse, Credentials, FeedResponse, RefreshRequest, RefreshResponse, RegisterPayload, User};

// =============================================================================
// TRAITS
// =============================================================================

/// Authentication endpoints.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/register`
    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/refresh`
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError>;

    /// `GET /auth/me`
    async fn current_user(&self) -> Result<User, ApiError>;
}

/// Notification feed endpoints.
#[async_trait::async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /notifications`
    async fn fetch(&self) -> Result<FeedResponse, ApiError>;

    /// `PATCH /notifications/{id}/read`
    async fn mark_read(&self, id: &str) -> Result<(), ApiError>;

    /// `PATCH /notifications/read-all`
    async fn mark_all_read(&self) -> Result<(), ApiError>;
}

// =============================================================================
// ENDPOINTS
// =============================================================================

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REGISTER_PATH: &str = "/auth/register";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";
pub(crate) const ME_PATH: &str = "/auth/me";
pub(crate) const NOTIFICATIONS_PATH: &str = "/notifications";
pub(crate) const READ_ALL_PATH: &str = "/notifications/read-all";

/// Ids are percent-encoded so a reserved character cannot change the route.
fn mark_read_path(id: &str) -> String {
    format!("/notifications/{}/read", urlencoding::encode(id))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// `reqwest`-backed implementation of both endpoint traits.
#[derive(Clone, Debug)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpApi {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn new(base_url: &str, tokens: TokenStore, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), tokens })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = join_url(&self.base_url, path);
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        match self.tokens.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Response { status: status.as_u16(), body: text });
        }
        Ok(text)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let text = Self::send(self.request(Method::POST, path).json(body)).await?;
        parse_body(&text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = Self::send(self.request(Method::GET, path)).await?;
        parse_body(&text)
    }

    async fn patch(&self, path: &str) -> Result<(), ApiError> {
        Self::send(self.request(Method::PATCH, path)).await?;
        Ok(())
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.post_json(LOGIN_PATH, credentials).await
    }

    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.post_json(REGISTER_PATH, payload).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        self.post_json(REFRESH_PATH, &RefreshRequest { refresh_token }).await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json(ME_PATH).await
    }
}

#[async_trait::async_trait]
impl NotificationApi for HttpApi {
    async fn fetch(&self) -> Result<FeedResponse, ApiError> {
        self.get_json(NOTIFICATIONS_PATH).await
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        self.patch(&mark_read_path(id)).await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.patch(READ_ALL_PATH).await
    }
}
