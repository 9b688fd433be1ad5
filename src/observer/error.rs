use thiserror::Error;

use crate::database::DatabaseError;

/// Why an observer refused a save. Any of these aborts `save_changes`
/// before a single write is issued.
#[derive(Debug, Error, Clone)]
pub enum ObserverError {
    #[error("{0}")]
    Validation(String),

    /// A write would break a relationship the schema restricts
    #[error("{0}")]
    Integrity(String),

    #[error("Observer timed out: {0}")]
    Timeout(String),

    /// Lookup an observer made against storage failed
    #[error("Storage error during save: {0}")]
    Storage(String),
}

impl From<DatabaseError> for ObserverError {
    fn from(error: DatabaseError) -> Self {
        ObserverError::Storage(error.to_string())
    }
}
