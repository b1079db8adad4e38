//! Core error types for cleanstreak-core.
//!
//! Every backend call is checked; an `Err` means the corresponding local
//! state mutation was skipped and the previous in-memory state still holds.

use std::path::PathBuf;
use thiserror::Error;

use crate::habit::HabitId;

/// Core error type for cleanstreak-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence backend rejected or failed a request
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The habit is not part of the active in-memory collection
    #[error("Habit not found: {0}")]
    HabitNotFound(HabitId),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by a [`Backend`](crate::store::Backend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or refused the request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Update targeted a record that does not exist
    #[error("No {collection} record with id {id}")]
    NotFound { collection: &'static str, id: String },

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Personal best can only grow
    #[error("max_streak_days cannot decrease (current {current}, requested {requested})")]
    MaxStreakDecrease { current: u32, requested: u32 },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => match code.code {
                rusqlite::ErrorCode::ConstraintViolation => {
                    StoreError::Conflict(msg.clone().unwrap_or_else(|| err.to_string()))
                }
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    StoreError::Unavailable(err.to_string())
                }
                _ => StoreError::QueryFailed(err.to_string()),
            },
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_core_error() {
        let err: CoreError = StoreError::Unavailable("offline".into()).into();
        assert!(matches!(err, CoreError::Store(StoreError::Unavailable(_))));
        assert_eq!(err.to_string(), "Store error: Backend unavailable: offline");
    }

    #[test]
    fn max_streak_decrease_message_names_both_values() {
        let err = ValidationError::MaxStreakDecrease {
            current: 50,
            requested: 3,
        };
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains('3'));
    }
}
