//! Key/value medium abstraction shared by the durable and session stores.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediumError {
    #[error("medium unavailable: {0}")]
    Unavailable(String),

    #[error("medium I/O failure on '{key}': {message}")]
    Io { key: String, message: String },

    #[error("invalid key '{0}'")]
    InvalidKey(String),
}

/// A string-to-string store, the shape of browser local/session storage.
pub trait KeyValueMedium: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError>;

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError>;

    fn remove(&self, key: &str) -> Result<(), MediumError>;

    fn keys(&self) -> Result<Vec<String>, MediumError>;
}
