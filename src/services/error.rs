use thiserror::Error;

use crate::auth::JwtError;
use crate::database::DatabaseError;
use crate::observer::ObserverError;

/// Error taxonomy of the domain services. The HTTP layer maps each variant
/// to exactly one status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ServiceError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }
}

// PostgreSQL SQLSTATE codes surfaced as domain errors
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<DatabaseError> for ServiceError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Observer(ObserverError::Integrity(msg))
            | DatabaseError::Observer(ObserverError::Validation(msg)) => ServiceError::Validation(msg),
            DatabaseError::Sqlx(sqlx::Error::Database(db_error)) => match db_error.code().as_deref() {
                Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) => {
                    ServiceError::Validation(db_error.message().to_string())
                }
                _ => ServiceError::Unexpected(db_error.to_string()),
            },
            other => ServiceError::Unexpected(other.to_string()),
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(error: JwtError) -> Self {
        ServiceError::Unexpected(error.to_string())
    }
}
