//! Persisted access/refresh token slots.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session client is the only writer; the auth store reads the access
//! slot once at construction. Storage backends are swappable so the same
//! store works with a volatile map, a JSON file, or nothing at all.
//!
//! ERROR HANDLING
//! ==============
//! Storage I/O never fails the caller. Reads degrade to `None` and writes are
//! logged and dropped, mirroring how a browser treats an unavailable
//! `localStorage`.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

// =============================================================================
// STORAGE BACKENDS
// =============================================================================

/// A string key-value slot that outlives the in-memory stores.
pub trait TokenStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// Volatile storage. Survives store reconstruction within one process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove_item(&self, key: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// JSON-object file storage, one top-level key per slot.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "token file unreadable; treating as empty");
                HashMap::new()
            }
        }
    }

    fn save(&self, items: &HashMap<String, String>) {
        let raw = match serde_json::to_string_pretty(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "token file encode failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            warn!(error = %e, path = %self.path.display(), "token file write failed");
        }
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.load();
        apply(&mut items);
        self.save(&items);
    }
}

impl TokenStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) {
        self.update(|items| {
            items.insert(key.to_owned(), value.to_owned());
        });
    }

    fn remove_item(&self, key: &str) {
        self.update(|items| {
            items.remove(key);
        });
    }
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Handle to the access/refresh token pair. Cheap to clone; clones share
/// the same backing slot.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn TokenStorage>>,
}

impl TokenStore {
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage: Some(storage) }
    }

    /// Store with a fresh volatile backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Store with no persistent storage available. Reads return `None`,
    /// writes do nothing.
    #[must_use]
    pub fn detached() -> Self {
        Self { storage: None }
    }

    #[must_use]
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    pub fn set(&self, access: &str, refresh: &str) {
        if let Some(storage) = &self.storage {
            storage.set_item(ACCESS_TOKEN_KEY, access);
            storage.set_item(REFRESH_TOKEN_KEY, refresh);
        }
    }

    /// Replace only the access token, leaving the refresh slot as is.
    pub fn set_access(&self, access: &str) {
        if let Some(storage) = &self.storage {
            storage.set_item(ACCESS_TOKEN_KEY, access);
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.storage.as_ref()?.get_item(ACCESS_TOKEN_KEY)
    }

    #[must_use]
    pub fn get_refresh(&self) -> Option<String> {
        self.storage.as_ref()?.get_item(REFRESH_TOKEN_KEY)
    }

    pub fn clear(&self) {
        if let Some(storage) = &self.storage {
            storage.remove_item(ACCESS_TOKEN_KEY);
            storage.remove_item(REFRESH_TOKEN_KEY);
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token values stay out of logs.
        f.debug_struct("TokenStore")
            .field("has_storage", &self.has_storage())
            .field("has_access", &self.get().is_some())
            .finish()
    }
}
