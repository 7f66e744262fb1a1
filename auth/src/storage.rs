//! Key/value persistence for sessions and PKCE verifiers.
//!
//! The shape mirrors the browser `Storage` API so a `localStorage` adapter
//! is a thin wrapper; natively and in tests the in-memory map is used.

use std::collections::HashMap;
use std::sync::Mutex;

pub const SESSION_KEY: &str = "coursehub.auth.session";
pub const CODE_VERIFIER_KEY: &str = "coursehub.auth.code-verifier";

pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

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

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.remove(key);
        }
    }
}
