//! Navigation side effect performed when a session ends.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

pub const LOGIN_ROUTE: &str = "/login";

/// Moves the presentation layer to its login surface.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Default navigator for headless use: records the redirect in the log.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self) {
        info!(route = LOGIN_ROUTE, "session ended; redirecting to login");
    }
}

/// Counts redirects. Handy for embedding code that wants to react to a
/// forced logout without wiring a callback.
#[derive(Debug, Default)]
pub struct CountingNavigator {
    redirects: AtomicUsize,
}

impl CountingNavigator {
    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
