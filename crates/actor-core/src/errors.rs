//! Unified error type for actor manager operations
//!
//! One flat enum covers every failure the manager surfaces to callers. The four
//! domain variants (`NotFound`, `PermissionDenied`, `InvalidInput`,
//! `NoActorChosen`) are the contract; the remaining variants wrap failures of
//! the underlying handlers.

use serde::{Deserialize, Serialize};

/// Unified error type for all actor manager operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ActorError {
    /// The URI has no backing record
    #[error("Not found: {message}")]
    NotFound {
        /// What was looked up
        message: String,
    },

    /// A confirmation was declined or a storage-access grant failed
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Why permission was refused
        message: String,
    },

    /// Malformed caller input (short nonce, truncated ciphertext, bad key, ...)
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input
        message: String,
    },

    /// A crypto operation was requested while no actor is chosen
    #[error("No actor chosen")]
    NoActorChosen,

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Description of the failure
        message: String,
    },

    /// Storage handler failed
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl ActorError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Error for a URI with no stored actor record
    pub fn actor_not_found(uri: impl std::fmt::Display) -> Self {
        Self::not_found(format!("Actor with ID \"{uri}\" does not exist"))
    }

    /// True for the `NotFound` variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Standard Result type for actor manager operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl From<serde_json::Error> for ActorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for ActorError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}
