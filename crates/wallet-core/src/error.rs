//! Error types for the wallet engine.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the whole wallet workspace.
///
/// Store-level failures (`StoreUnavailable`, `CorruptRecord`, `DeviceMismatch`)
/// are normally logged and swallowed at the component boundary; they exist as
/// variants so lower layers can report *why* a record was treated as absent.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum WalletError {
    /// The persistent medium cannot be used
    #[error("Storage unavailable")]
    StoreUnavailable,

    /// Checksum mismatch or undecodable payload
    #[error("Corrupt record '{key}': {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Synchronous user-input rejection
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// A usage cap was hit before the flow started
    #[error("Limit reached: at most {limit} allowed")]
    LimitReached { limit: u32 },

    /// Terminal business-rule failure of a simulated payment
    #[error("Payment rejected: {reason}")]
    SimulatedRejection { reason: String },

    /// Persisted record belongs to another device
    #[error("Record '{key}' belongs to another device")]
    DeviceMismatch { key: String },

    /// Credential or access-code failure
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Operation requires a logged-in user
    #[error("No active session")]
    NoActiveSession,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_limit_reached(&self) -> bool {
        matches!(self, Self::LimitReached { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Errors that callers must treat exactly like a missing record.
    pub fn is_treated_as_absent(&self) -> bool {
        matches!(
            self,
            Self::CorruptRecord { .. } | Self::DeviceMismatch { .. } | Self::StoreUnavailable
        )
    }

    /// Field name for validation errors, used for inline error placement.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, WalletError>`.
pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_carries_field() {
        let err = WalletError::validation("reference", "La referencia es obligatoria");
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("reference"));
        assert!(!err.is_treated_as_absent());
    }

    #[test]
    fn test_store_errors_are_treated_as_absent() {
        assert!(WalletError::corrupt("k", "checksum").is_treated_as_absent());
        assert!(
            WalletError::DeviceMismatch {
                key: "k".to_string()
            }
            .is_treated_as_absent()
        );
        assert!(WalletError::StoreUnavailable.is_treated_as_absent());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WalletError = io.into();
        match err {
            WalletError::Io { message } => assert!(message.contains("NotFound")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
