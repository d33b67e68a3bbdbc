//! Client-side session and notification state synchronization.
//!
//! ARCHITECTURE
//! ============
//! - [`token_store`]: persisted access/refresh token slots.
//! - [`session`]: auth endpoints + token persistence, no reactive state.
//! - [`auth`]: reactive auth store driven through the session client.
//! - [`notifications`]: reactive, optimistically-updated feed cache.
//! - [`api`]: endpoint traits and the HTTP implementation behind them.
//!
//! Stores are explicit handles. Nothing here is a global; whoever renders
//! state is handed the store it renders.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod navigator;
pub mod notifications;
pub mod push;
pub mod refreshing;
pub mod session;
pub mod token_store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

pub use api::{AuthApi, HttpApi, NotificationApi};
pub use auth::{AuthState, AuthStore, SessionPhase};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use navigator::{LogNavigator, Navigator};
pub use notifications::{FeedFailure, FeedOp, NotificationCache, NotificationState};
pub use refreshing::RefreshingFeed;
pub use session::SessionClient;
pub use token_store::{FileStorage, MemoryStorage, TokenStorage, TokenStore};
pub use types::{AuthResponse, Credentials, Notification, RegisterPayload, User};

/// Both stores wired over one HTTP client and token slot.
#[derive(Clone, Debug)]
pub struct ClientStores {
    pub auth: AuthStore,
    pub notifications: NotificationCache,
}

impl ClientStores {
    /// Wire the stores against `config.api_url`. The feed goes through
    /// [`RefreshingFeed`] so an expired access token gets one refresh, and a
    /// rejected refresh ends the session in the auth store as well.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig, tokens: TokenStore, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let http = Arc::new(HttpApi::new(&config.api_url, tokens.clone(), config.timeouts)?);
        let session = SessionClient::new(http.clone(), tokens).with_navigator(navigator);
        let auth = AuthStore::new(session);
        let feed = RefreshingFeed::new(http, auth.clone());
        Ok(Self { auth, notifications: NotificationCache::new(Arc::new(feed)) })
    }
}
