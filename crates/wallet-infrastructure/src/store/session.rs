//! Short-lived session storage: login flag plus hand-off payloads between flows.

use crate::keys::session as keys;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use wallet_core::storage::KeyValueMedium;

const ACTIVE_VALUE: &str = "active";

#[derive(Clone)]
pub struct SessionStore {
    medium: Arc<dyn KeyValueMedium>,
}

impl SessionStore {
    pub fn new(medium: Arc<dyn KeyValueMedium>) -> Self {
        Self { medium }
    }

    pub fn is_active(&self) -> bool {
        self.get_str(keys::ACTIVE).as_deref() == Some(ACTIVE_VALUE)
    }

    pub fn set_active(&self) -> bool {
        self.set_str(keys::ACTIVE, ACTIVE_VALUE)
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.medium.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to read '{}': {}", key, e);
                None
            }
        }
    }

    pub fn set_str(&self, key: &str, value: &str) -> bool {
        match self.medium.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to write '{}': {}", key, e);
                false
            }
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_str(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("[SessionStore] '{}' is not valid JSON: {}", key, e);
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.set_str(key, &json),
            Err(e) => {
                tracing::warn!("[SessionStore] Cannot serialize '{}': {}", key, e);
                false
            }
        }
    }

    /// Reads and deletes `key`. The value is removed even when it does not
    /// parse, so a bad payload cannot be consumed twice.
    pub fn take_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_str(key)?;
        self.remove(key);
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("[SessionStore] Dropping malformed '{}': {}", key, e);
                None
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.medium.remove(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to remove '{}': {}", key, e);
                false
            }
        }
    }

    /// Removes every session key.
    pub fn clear(&self) {
        for key in keys::ALL {
            self.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::MemoryMedium;
    use serde_json::{Value, json};

    #[test]
    fn test_active_flag() {
        let session = SessionStore::new(Arc::new(MemoryMedium::new()));
        assert!(!session.is_active());
        session.set_active();
        assert!(session.is_active());
        session.clear();
        assert!(!session.is_active());
    }

    #[test]
    fn test_take_consumes_once() {
        let session = SessionStore::new(Arc::new(MemoryMedium::new()));
        session.set_json(keys::TRANSFER_DATA, &json!({"amount": "5"}));
        assert!(session.take_json::<Value>(keys::TRANSFER_DATA).is_some());
        assert!(session.take_json::<Value>(keys::TRANSFER_DATA).is_none());
    }

    #[test]
    fn test_take_drops_malformed_payload() {
        let medium = MemoryMedium::new();
        let session = SessionStore::new(Arc::new(medium.clone()));
        session.set_str(keys::TRANSFER_DATA, "{broken");
        assert!(session.take_json::<Value>(keys::TRANSFER_DATA).is_none());
        assert!(medium.is_empty());
    }
}
