//! Session client — mediates between the auth endpoints and the token store.
//!
//! ARCHITECTURE
//! ============
//! This is the only writer of the token slots. It never touches reactive
//! state; the auth store decides what a success or failure means for the
//! user-visible session.
//!
//! TRADE-OFFS
//! ==========
//! `refresh` is fail-closed: any failure (network or rejection) ends the
//! session instead of retrying, so a stale refresh token can never keep a
//! half-valid session alive.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::AuthApi;
use crate::error::ApiError;
use crate::navigator::{LogNavigator, Navigator};
use crate::token_store::TokenStore;
use crate::types::{AuthResponse, Credentials, RegisterPayload, User};

#[derive(Clone)]
pub struct SessionClient {
    api: Arc<dyn AuthApi>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
}

impl SessionClient {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, tokens: TokenStore) -> Self {
        Self { api, tokens, navigator: Arc::new(LogNavigator) }
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Exchange credentials for a session and persist both tokens.
    ///
    /// # Errors
    ///
    /// Returns the remote error unchanged; nothing is stored on failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let response = self.api.login(credentials).await?;
        self.tokens.set(&response.access_token, &response.refresh_token);
        info!(user_id = %response.user.id, "logged in");
        Ok(response)
    }

    /// Create an account and persist the returned tokens.
    ///
    /// # Errors
    ///
    /// Returns the remote error unchanged; nothing is stored on failure.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        let response = self.api.register(payload).await?;
        self.tokens.set(&response.access_token, &response.refresh_token);
        info!(user_id = %response.user.id, "registered");
        Ok(response)
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// Returns `None` without a network call when no refresh token is stored.
    /// On any failure the session is logged out and `None` is returned.
    pub async fn refresh(&self) -> Option<String> {
        let refresh_token = self.tokens.get_refresh()?;
        match self.api.refresh(&refresh_token).await {
            Ok(response) => {
                match response.refresh_token.as_deref() {
                    Some(rotated) => self.tokens.set(&response.access_token, rotated),
                    None => self.tokens.set_access(&response.access_token),
                }
                info!(rotated = response.refresh_token.is_some(), "access token refreshed");
                Some(response.access_token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed; ending session");
                self.logout();
                None
            }
        }
    }

    /// Drop both tokens and send the user to the login surface.
    pub fn logout(&self) {
        self.tokens.clear();
        self.navigator.redirect_to_login();
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns the remote error unchanged.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.api.current_user().await
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient").field("tokens", &self.tokens).finish_non_exhaustive()
    }
}
