//! Local persisted key-value storage for standalone mode.
//!
//! When no hosting shell supplies a session, the view falls back to the same
//! keys the browser build keeps in local storage. The trait keeps the actual
//! backend (web local storage, a config file, a test map) out of the business
//! layer.

use std::collections::HashMap;

/// Well-known storage keys, matching the shell's conventions.
pub mod keys {
    /// Raw bearer token string.
    pub const AUTH_TOKEN: &str = "auth_token";
    /// JSON-encoded user record.
    pub const USER_DATA: &str = "user_data";
    /// Theme flag, the string `"true"` means dark.
    pub const DARK_MODE: &str = "darkMode";
}

pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory storage used in tests and on platforms without persisted
/// key-value storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}
