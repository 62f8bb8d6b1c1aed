//! Error types for Agent Network operations

use thiserror::Error;

use crate::identity::{MessageId, ThreadId};

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Thread not found: {id}")]
    ThreadNotFound { id: ThreadId },

    #[error("Message not found: {id}")]
    MessageNotFound { id: MessageId },

    #[error("Id conflict for {entity}: {id}")]
    IdConflict { entity: String, id: u64 },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Sender {sender} is not a participant of thread {thread_id}")]
    NotAParticipant { thread_id: ThreadId, sender: String },
}

/// Liveness check failure. Lists every agent that could not be reached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Agents unreachable: {}", unreachable.join(", "))]
pub struct LivenessError {
    pub unreachable: Vec<String>,
}

impl LivenessError {
    /// Builds the error with names sorted and deduplicated.
    pub fn new(mut unreachable: Vec<String>) -> Self {
        unreachable.sort();
        unreachable.dedup();
        Self { unreachable }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Agent Network errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Liveness error: {0}")]
    Liveness(#[from] LivenessError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Agent Network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

impl NetworkError {
    /// True for errors that name a missing thread or message.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NetworkError::Storage(StorageError::ThreadNotFound { .. })
                | NetworkError::Storage(StorageError::MessageNotFound { .. })
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::ThreadNotFound { id: ThreadId::new(3) };
        assert_eq!(err.to_string(), "Thread not found: 3");
    }

    #[test]
    fn test_liveness_error_sorted_and_deduped() {
        let err = LivenessError::new(vec!["b".into(), "a".into(), "b".into()]);
        assert_eq!(err.unreachable, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Agents unreachable: a, b");
    }

    #[test]
    fn test_network_error_from_conversions() {
        let err: NetworkError = StorageError::LockPoisoned.into();
        assert!(matches!(err, NetworkError::Storage(StorageError::LockPoisoned)));

        let err: NetworkError = ValidationError::RequiredFieldMissing {
            field: "name".into(),
        }
        .into();
        assert!(matches!(err, NetworkError::Validation(_)));
    }

    #[test]
    fn test_is_not_found() {
        let err: NetworkError = StorageError::MessageNotFound { id: MessageId::new(1) }.into();
        assert!(err.is_not_found());
        let err: NetworkError = StorageError::LockPoisoned.into();
        assert!(!err.is_not_found());
    }
}
