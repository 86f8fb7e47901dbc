//! Core error type.

use parlor_store::StoreError;
use thiserror::Error;

/// Errors returned by core operations.
///
/// Every error is local to one operation and leaves the store unchanged,
/// except `Store`, which reports a backend failure as-is.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A participant with this name already exists.
    #[error("Participant already exists: {0}")]
    Conflict(String),

    /// The referenced participant does not exist or was not named.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The sender has no active presence.
    #[error("Sender is not a participant: {0}")]
    UnauthorizedSender(String),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

impl ChatError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "validation",
            ChatError::Conflict(_) => "conflict",
            ChatError::NotFound(_) => "not_found",
            ChatError::UnauthorizedSender(_) => "unauthorized_sender",
            ChatError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(key) => ChatError::Conflict(key),
            other => ChatError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: ChatError = StoreError::Conflict("Alice".into()).into();
        assert!(matches!(err, ChatError::Conflict(ref name) if name == "Alice"));
        assert_eq!(err.kind(), "conflict");

        let err: ChatError = StoreError::Unavailable("down".into()).into();
        assert_eq!(err.kind(), "store");
    }
}
