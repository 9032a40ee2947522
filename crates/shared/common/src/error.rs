//! Unified application error handling.
//!
//! Separates the failure kinds callers must tell apart: a missing row, a
//! failing store, a lifecycle contract violation and authentication refusals.

use std::fmt::Display;

use domain::DomainError;
use thiserror::Error;

/// Boxed error retained as the cause of a storage failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: String, id: String },

    #[error("Failed to {operation} {entity}")]
    Storage {
        operation: String,
        entity: String,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    InvalidState(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // Authentication
    #[error("Account temporarily locked")]
    AccountLocked,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Storage { .. } => "STORAGE_ERROR",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::AccountLocked => "ACCOUNT_LOCKED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Storage {
                operation,
                entity,
                source,
            } => {
                tracing::error!("Storage error while trying to {} {}: {:?}", operation, entity, source);
                "A storage error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }

    /// Check whether this is a not-found failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            field @ DomainError::Field { .. } => AppError::Validation(field.to_string()),
            DomainError::InvalidState(msg) => AppError::InvalidState(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str, id: impl Display) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str, id: impl Display) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(entity, id))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(entity: impl Into<String>, id: impl Display) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn storage(
        operation: impl Into<String>,
        entity: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        AppError::Storage {
            operation: operation.into(),
            entity: entity.into(),
            source: source.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_not_found_message_names_entity_and_id() {
        let err = None::<()>.ok_or_not_found("Booking", 42).unwrap_err();
        assert_eq!(err.to_string(), "Booking not found with id: 42");
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_storage_keeps_cause() {
        let cause = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err = AppError::storage("find all", "User", cause);

        assert_eq!(err.to_string(), "Failed to find all User");
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");
        assert_eq!(err.user_message(), "A storage error occurred");
    }

    #[test]
    fn test_domain_conversion() {
        let err: AppError = DomainError::invalid_state("User 1 is already deleted").into();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err: AppError = DomainError::field("email_verified", "expected bool").into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
