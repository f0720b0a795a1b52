/// Storage-specific errors
use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A period that does not exist on the calendar
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Two broadcasts cannot start at the same second
    #[error("A track is already recorded at {0}")]
    DuplicateStart(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for timeuh_core::TimeuhError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPeriod(msg) => timeuh_core::TimeuhError::InvalidInput(msg),
            StorageError::DuplicateStart(at) => timeuh_core::TimeuhError::DuplicateStart(at),
            other => timeuh_core::TimeuhError::storage(other.to_string()),
        }
    }
}
