//! Notification API decorator that retries once after refreshing the
//! access token.
//!
//! A 401 from the feed triggers the auth store's single refresh attempt.
//! If that yields a new token the request is replayed once; any other
//! outcome returns the original error. Going through the store rather than
//! the bare session client means a failed refresh has already left the
//! published auth state anonymous by the time this returns.

#[cfg(test)]
#[path = "refreshing_test.rs"]
mod tests;

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::api::NotificationApi;
use crate::auth::AuthStore;
use crate::error::ApiError;
use crate::types::FeedResponse;

pub struct RefreshingFeed {
    inner: Arc<dyn NotificationApi>,
    auth: AuthStore,
}

impl RefreshingFeed {
    #[must_use]
    pub fn new(inner: Arc<dyn NotificationApi>, auth: AuthStore) -> Self {
        Self { inner, auth }
    }

    async fn with_refresh<T, F, Fut>(&self, call: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ApiError>> + Send,
        T: Send,
    {
        match call().await {
            Err(e) if e.is_unauthorized() => {
                if self.auth.refresh().await.is_none() {
                    return Err(e);
                }
                info!("access token refreshed; replaying request");
                call().await
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl NotificationApi for RefreshingFeed {
    async fn fetch(&self) -> Result<FeedResponse, ApiError> {
        self.with_refresh(|| self.inner.fetch()).await
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        self.with_refresh(|| self.inner.mark_read(id)).await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.with_refresh(|| self.inner.mark_all_read()).await
    }
}
