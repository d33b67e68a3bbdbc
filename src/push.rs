//! Push listener — feeds websocket-delivered notifications into the cache.
//!
//! DESIGN
//! ======
//! Each text frame carries one notification, either bare or wrapped as
//! `{ "data": { ... } }`. Frames that do not parse are logged and skipped.
//! The listener ends when the socket closes; reconnecting is left to the
//! caller.

#[cfg(test)]
#[path = "push_test.rs"]
mod tests;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::notifications::NotificationCache;
use crate::token_store::TokenStore;
use crate::types::Notification;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket read failed: {0}")]
    Read(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("invalid authorization header")]
    InvalidHeader,
    #[error("push frame parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PushFrame {
    Bare(Notification),
    Envelope { data: Notification },
}

/// Decode one push frame into a notification.
///
/// # Errors
///
/// Returns [`PushError::Parse`] if the text is neither shape.
pub fn parse_push_message(raw: &str) -> Result<Notification, PushError> {
    let frame: PushFrame = serde_json::from_str(raw)?;
    Ok(match frame {
        PushFrame::Bare(n) | PushFrame::Envelope { data: n } => n,
    })
}

/// Connect and deliver frames until the server closes the socket.
/// Returns the number of notifications delivered.
///
/// # Errors
///
/// Returns a [`PushError`] if the connection cannot be opened or a read
/// fails mid-stream.
pub async fn run_push_listener(url: &str, tokens: &TokenStore, cache: &NotificationCache) -> Result<usize, PushError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| PushError::Connect(Box::new(e)))?;
    if let Some(token) = tokens.get() {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| PushError::InvalidHeader)?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (mut stream, _) = connect_async(request)
        .await
        .map_err(|e| PushError::Connect(Box::new(e)))?;
    info!(%url, "push listener connected");

    let mut delivered = 0_usize;
    while let Some(message) = stream.next().await {
        match message.map_err(|e| PushError::Read(Box::new(e)))? {
            Message::Text(text) => match parse_push_message(text.as_str()) {
                Ok(notification) => {
                    cache.add_notification(notification);
                    delivered += 1;
                }
                Err(e) => warn!(error = %e, "skipping malformed push frame"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(delivered, "push listener closed");
    Ok(delivered)
}

/// Run the listener in the background. Errors are logged, not returned.
pub fn spawn_push_listener(url: String, tokens: TokenStore, cache: NotificationCache) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = run_push_listener(&url, &tokens, &cache).await {
            error!(error = %e, "push listener stopped");
        }
    })
}
