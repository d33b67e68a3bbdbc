//! Scripted API doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use crate::api::{AuthApi, NotificationApi};
use crate::error::ApiError;
use crate::types::{AuthResponse, Credentials, FeedResponse, Notification, RefreshResponse, RegisterPayload, User};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unscripted() -> ApiError {
    ApiError::Request("no scripted response".into())
}

pub fn user(id: &str) -> User {
    User { id: id.into(), email: format!("{id}@example.com"), name: Some(id.to_uppercase()), role: None }
}

pub fn auth_response(user_id: &str, access: &str, refresh: &str) -> AuthResponse {
    AuthResponse { user: user(user_id), access_token: access.into(), refresh_token: refresh.into() }
}

pub fn rejected(status: u16, message: &str) -> ApiError {
    ApiError::Response { status, body: serde_json::json!({ "message": message }).to_string() }
}

pub fn credentials() -> Credentials {
    Credentials { email: "ada@example.com".into(), password: "hunter2".into() }
}

// =============================================================================
// MockAuthApi
// =============================================================================

#[derive(Default)]
pub struct MockAuthApi {
    pub login_results: Mutex<VecDeque<Result<AuthResponse, ApiError>>>,
    pub register_results: Mutex<VecDeque<Result<AuthResponse, ApiError>>>,
    pub refresh_results: Mutex<VecDeque<Result<RefreshResponse, ApiError>>>,
    pub user_results: Mutex<VecDeque<Result<User, ApiError>>>,
    pub refresh_calls: Mutex<Vec<String>>,
    pub login_calls: Mutex<usize>,
    pub user_calls: Mutex<usize>,
    /// When set, `login` waits for a notification before answering.
    pub login_gate: Mutex<Option<Arc<Notify>>>,
    pub user_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockAuthApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_login(&self, result: Result<AuthResponse, ApiError>) {
        lock(&self.login_results).push_back(result);
    }

    pub fn push_register(&self, result: Result<AuthResponse, ApiError>) {
        lock(&self.register_results).push_back(result);
    }

    pub fn push_refresh(&self, result: Result<RefreshResponse, ApiError>) {
        lock(&self.refresh_results).push_back(result);
    }

    pub fn push_user(&self, result: Result<User, ApiError>) {
        lock(&self.user_results).push_back(result);
    }

    pub fn gate_login(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.login_gate) = Some(gate.clone());
        gate
    }

    pub fn gate_user(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.user_gate) = Some(gate.clone());
        gate
    }

    pub fn refresh_calls(&self) -> Vec<String> {
        lock(&self.refresh_calls).clone()
    }

    pub fn login_calls(&self) -> usize {
        *lock(&self.login_calls)
    }

    pub fn user_calls(&self) -> usize {
        *lock(&self.user_calls)
    }
}

#[async_trait::async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        *lock(&self.login_calls) += 1;
        let gate = lock(&self.login_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        lock(&self.login_results).pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn register(&self, _payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        lock(&self.register_results).pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        lock(&self.refresh_calls).push(refresh_token.to_owned());
        lock(&self.refresh_results).pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        *lock(&self.user_calls) += 1;
        let gate = lock(&self.user_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        lock(&self.user_results).pop_front().unwrap_or_else(|| Err(unscripted()))
    }
}

// =============================================================================
// MockFeed
// =============================================================================

#[derive(Default)]
pub struct MockFeed {
    pub fetch_results: Mutex<VecDeque<Result<FeedResponse, ApiError>>>,
    /// Scripted mark-read outcomes; an empty queue answers `Ok(())`.
    pub mark_read_results: Mutex<VecDeque<Result<(), ApiError>>>,
    pub mark_all_results: Mutex<VecDeque<Result<(), ApiError>>>,
    pub mark_read_calls: Mutex<Vec<String>>,
    pub mark_all_calls: Mutex<usize>,
    pub fetch_calls: Mutex<usize>,
}

impl MockFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_fetch(&self, result: Result<FeedResponse, ApiError>) {
        lock(&self.fetch_results).push_back(result);
    }

    pub fn push_items(&self, items: Vec<Notification>) {
        self.push_fetch(Ok(FeedResponse::Bare(items)));
    }

    pub fn push_mark_read(&self, result: Result<(), ApiError>) {
        lock(&self.mark_read_results).push_back(result);
    }

    pub fn push_mark_all(&self, result: Result<(), ApiError>) {
        lock(&self.mark_all_results).push_back(result);
    }

    pub fn mark_read_calls(&self) -> Vec<String> {
        lock(&self.mark_read_calls).clone()
    }

    pub fn mark_all_calls(&self) -> usize {
        *lock(&self.mark_all_calls)
    }

    pub fn fetch_calls(&self) -> usize {
        *lock(&self.fetch_calls)
    }
}

#[async_trait::async_trait]
impl NotificationApi for MockFeed {
    async fn fetch(&self) -> Result<FeedResponse, ApiError> {
        *lock(&self.fetch_calls) += 1;
        lock(&self.fetch_results).pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        lock(&self.mark_read_calls).push(id.to_owned());
        lock(&self.mark_read_results).pop_front().unwrap_or(Ok(()))
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        *lock(&self.mark_all_calls) += 1;
        lock(&self.mark_all_results).pop_front().unwrap_or(Ok(()))
    }
}

/// Three-entry feed, newest first, with one entry already read.
pub fn sample_feed() -> Vec<Notification> {
    vec![
        Notification::new("n3", "third"),
        Notification::new("n2", "second").read(),
        Notification::new("n1", "first"),
    ]
}
