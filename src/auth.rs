//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The single source of truth presentation renders from. Every change goes
//! through one of the operations below, which drive the session client and
//! then publish a new snapshot on a `watch` channel.
//!
//! DESIGN
//! ======
//! State is kept as flags (`user`, `is_authenticated`, `is_loading`, `error`)
//! and the named phase is derived on demand. Snapshots are replaced between
//! awaits only, so a subscriber never sees a half-applied transition.
//!
//! Concurrent operations are not serialized. A login that resolves after a
//! logout issued during its flight still applies (last write wins); the
//! session epoch makes that case visible in the log. A user fetch has no
//! token of its own to write, so under a newer epoch its result is dropped.

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::session::SessionClient;
use crate::types::{AuthResponse, Credentials, RegisterPayload, User};

pub const DEFAULT_LOGIN_ERROR: &str = "Login failed. Please check your credentials and try again.";
pub const DEFAULT_REGISTER_ERROR: &str = "Registration failed. Please try again.";

/// Snapshot of the auth session exposed to presentation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Named view of the flag combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    /// Token present but the user is missing or being fetched.
    AuthenticatedStale,
}

impl AuthState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (self.is_authenticated, self.is_loading, self.user.is_some()) {
            (false, true, _) => SessionPhase::Authenticating,
            (false, false, _) => SessionPhase::Anonymous,
            (true, false, true) => SessionPhase::Authenticated,
            (true, _, _) => SessionPhase::AuthenticatedStale,
        }
    }
}

#[derive(Clone, Copy)]
enum Entry {
    Login,
    Register,
}

impl Entry {
    fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
        }
    }

    fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => DEFAULT_LOGIN_ERROR,
            Self::Register => DEFAULT_REGISTER_ERROR,
        }
    }
}

/// Reactive auth store. Clones share state.
#[derive(Clone)]
pub struct AuthStore {
    session: SessionClient,
    state: Arc<watch::Sender<AuthState>>,
    epoch: Arc<AtomicU64>,
}

impl AuthStore {
    /// Build the store, trusting any access token already persisted.
    /// Call [`AuthStore::fetch_user`] to confirm or revoke that trust.
    #[must_use]
    pub fn new(session: SessionClient) -> Self {
        let initial = AuthState { is_authenticated: session.tokens().get().is_some(), ..AuthState::default() };
        let (tx, _rx) = watch::channel(initial);
        Self { session, state: Arc::new(tx), epoch: Arc::new(AtomicU64::new(0)) }
    }

    #[must_use]
    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// # Errors
    ///
    /// Re-raises the remote error after recording its message in `error`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.begin();
        let epoch = self.current_epoch();
        let result = self.session.login(credentials).await;
        self.finish(Entry::Login, epoch, result)
    }

    /// # Errors
    ///
    /// Re-raises the remote error after recording its message in `error`.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.begin();
        let epoch = self.current_epoch();
        let result = self.session.register(payload).await;
        self.finish(Entry::Register, epoch, result)
    }

    /// End the session. Always succeeds.
    pub fn logout(&self) {
        self.session.logout();
        self.reset_anonymous();
        info!("logged out");
    }

    /// Load the current user; an unfetchable user ends the session.
    ///
    /// A result that arrives after the session ended is dropped, since this
    /// call writes no token and could not make the flags consistent again.
    pub async fn fetch_user(&self) {
        let epoch = self.current_epoch();
        self.state.send_modify(|s| s.is_loading = true);
        let result = self.session.current_user().await;
        if self.current_epoch() != epoch {
            warn!(ok = result.is_ok(), "session ended while user fetch was in flight; dropping result");
            return;
        }
        match result {
            Ok(user) => {
                let has_token = self.session.tokens().get().is_some();
                self.state.send_modify(|s| {
                    s.user = has_token.then_some(user);
                    s.is_authenticated = has_token;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!(error = %e, "user fetch failed; ending session");
                self.session.logout();
                self.reset_anonymous();
            }
        }
    }

    /// Refresh the access token; a failed refresh leaves the store anonymous.
    pub async fn refresh(&self) -> Option<String> {
        let token = self.session.refresh().await;
        let revoked = self.session.tokens().get().is_none();
        if token.is_none() && revoked && self.state.borrow().is_authenticated {
            self.reset_anonymous();
        }
        token
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish(
        &self,
        entry: Entry,
        started_epoch: u64,
        result: Result<AuthResponse, ApiError>,
    ) -> Result<AuthResponse, ApiError> {
        match result {
            Ok(response) => {
                if self.current_epoch() != started_epoch {
                    warn!(op = entry.label(), "session ended while request was in flight; applying latest result");
                }
                let user = response.user.clone();
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                Ok(response)
            }
            Err(e) => {
                let message = e.message().unwrap_or_else(|| entry.fallback_message().to_owned());
                warn!(op = entry.label(), error = %e, "authentication rejected");
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.is_loading = false;
                });
                Err(e)
            }
        }
    }

    fn reset_anonymous(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(AuthState::default());
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore").field("state", &*self.state.borrow()).finish_non_exhaustive()
    }
}
