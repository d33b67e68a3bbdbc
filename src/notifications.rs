//! Notification cache — local copy of the server feed with optimistic
//! read-state updates.
//!
//! DESIGN
//! ======
//! The server is the authority; this cache is the client's copy-of-record,
//! newest first. Read-state changes are applied locally before the server
//! confirms them and are never rolled back. The way to converge after a
//! failed update is another `fetch_notifications`, not a revert.
//!
//! ERROR HANDLING
//! ==============
//! Notifications are not session-critical, so every remote failure here is
//! swallowed. Each one is logged and handed to the optional failure sink so
//! callers and tests can still observe it.

#[cfg(test)]
#[path = "notifications_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::NotificationApi;
use crate::error::ApiError;
use crate::types::Notification;

/// Snapshot of the cached feed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub is_loading: bool,
}

impl NotificationState {
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    fn recount(&mut self) {
        self.unread_count = count_unread(&self.notifications);
    }
}

#[must_use]
pub fn count_unread(items: &[Notification]) -> usize {
    items.iter().filter(|n| !n.is_read).count()
}

/// The remote operation a swallowed failure came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedOp {
    Fetch,
    MarkRead(String),
    MarkAllRead,
}

/// A remote failure the cache absorbed.
#[derive(Clone, Debug)]
pub struct FeedFailure {
    pub op: FeedOp,
    pub error: ApiError,
}

pub type FailureSink = Arc<dyn Fn(&FeedFailure) + Send + Sync>;

/// Reactive notification store. Clones share state.
#[derive(Clone)]
pub struct NotificationCache {
    api: Arc<dyn NotificationApi>,
    state: Arc<watch::Sender<NotificationState>>,
    on_failure: Option<FailureSink>,
}

impl NotificationCache {
    #[must_use]
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        let (tx, _rx) = watch::channel(NotificationState::default());
        Self { api, state: Arc::new(tx), on_failure: None }
    }

    #[must_use]
    pub fn with_failure_sink(mut self, sink: FailureSink) -> Self {
        self.on_failure = Some(sink);
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state.borrow().unread_count
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    /// Replace the cache with the server feed. Failures keep the cached
    /// entries and only clear the loading flag.
    pub async fn fetch_notifications(&self) {
        self.state.send_modify(|s| s.is_loading = true);
        match self.api.fetch().await {
            Ok(feed) => {
                let items = feed.into_items();
                debug!(count = items.len(), "notifications fetched");
                self.state.send_modify(|s| {
                    s.notifications = items;
                    s.recount();
                    s.is_loading = false;
                });
            }
            Err(error) => {
                self.state.send_modify(|s| s.is_loading = false);
                self.report(FeedOp::Fetch, error);
            }
        }
    }

    /// Mark one entry read locally, then tell the server. Not rolled back
    /// if the server refuses.
    pub async fn mark_as_read(&self, id: &str) {
        self.state.send_if_modified(|s| {
            let Some(entry) = s.notifications.iter_mut().find(|n| n.id == id) else {
                return false;
            };
            if entry.is_read {
                return false;
            }
            entry.is_read = true;
            s.recount();
            true
        });
        if let Err(error) = self.api.mark_read(id).await {
            self.report(FeedOp::MarkRead(id.to_owned()), error);
        }
    }

    /// Tell the server everything is read, then mark every cached entry read
    /// whatever the outcome.
    pub async fn mark_all_as_read(&self) {
        if let Err(error) = self.api.mark_all_read().await {
            self.report(FeedOp::MarkAllRead, error);
        }
        self.state.send_modify(|s| {
            for n in &mut s.notifications {
                n.is_read = true;
            }
            s.unread_count = 0;
        });
    }

    /// Prepend a pushed entry. Purely local.
    pub fn add_notification(&self, notification: Notification) {
        self.state.send_modify(|s| {
            if !notification.is_read {
                s.unread_count += 1;
            }
            s.notifications.insert(0, notification);
        });
    }

    fn report(&self, op: FeedOp, error: ApiError) {
        warn!(op = ?op, error = %error, "notification sync failed; keeping cached state");
        if let Some(sink) = &self.on_failure {
            sink(&FeedFailure { op, error });
        }
    }
}

impl std::fmt::Debug for NotificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCache")
            .field("state", &*self.state.borrow())
            .field("has_failure_sink", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}
