/// Core error types for Timeuh Machine
use thiserror::Error;

use crate::types::{Provider, TrackId};

/// Result type alias using `TimeuhError`
pub type Result<T> = std::result::Result<T, TimeuhError>;

/// Core error type for Timeuh Machine
#[derive(Error, Debug)]
pub enum TimeuhError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Track not found
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Invalid input (bad dates, unknown providers, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors (bad exclude patterns, missing secrets)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error talking to an external service
    #[error("Network error: {0}")]
    Network(String),

    /// The external service answered with something we could not use
    #[error("Bad response: {0}")]
    BadResponse(String),

    /// OAuth token missing, expired or rejected
    #[error("{provider} authorization error: {message}")]
    Authorization {
        /// Provider that refused the token
        provider: Provider,
        /// Details
        message: String,
    },

    /// Another broadcast is already recorded at this start time
    #[error("A track is already recorded at {0}")]
    DuplicateStart(String),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),
}

impl TimeuhError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a bad response error
    pub fn bad_response(msg: impl Into<String>) -> Self {
        Self::BadResponse(msg.into())
    }

    /// Create an authorization error for a provider
    pub fn authorization(provider: Provider, msg: impl Into<String>) -> Self {
        Self::Authorization {
            provider,
            message: msg.into(),
        }
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for TimeuhError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
