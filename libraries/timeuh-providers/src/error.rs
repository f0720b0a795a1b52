//! Error types for the provider clients.

use thiserror::Error;
use timeuh_core::{Provider, TimeuhError};

/// Errors that can occur when talking to an external service.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service returned an error status
    #[error("Service error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Failed to parse the service response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Misconfigured endpoint
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Token missing, expired or refused
    #[error("{provider} authorization failed: {message}")]
    Unauthorized { provider: Provider, message: String },

    /// The provider reported an error in an otherwise successful response
    #[error("{provider} API error: {message}")]
    Api { provider: Provider, message: String },
}

impl ProviderError {
    /// Attribute authentication statuses to a provider
    pub(crate) fn for_provider(self, provider: Provider) -> Self {
        match self {
            ProviderError::Status { status: 401 | 403, message } => {
                ProviderError::Unauthorized { provider, message }
            }
            other => other,
        }
    }
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

impl From<ProviderError> for TimeuhError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Request(e) => TimeuhError::network(e.to_string()),
            e @ ProviderError::Status { .. } => TimeuhError::network(e.to_string()),
            ProviderError::ParseError(msg) => TimeuhError::bad_response(msg),
            ProviderError::InvalidUrl(msg) => TimeuhError::config(msg),
            ProviderError::Unauthorized { provider, message } => {
                TimeuhError::authorization(provider, message)
            }
            e @ ProviderError::Api { .. } => TimeuhError::bad_response(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_become_unauthorized() {
        let err = ProviderError::Status {
            status: 401,
            message: "expired".into(),
        }
        .for_provider(Provider::Spotify);
        assert!(matches!(
            TimeuhError::from(err),
            TimeuhError::Authorization {
                provider: Provider::Spotify,
                ..
            }
        ));

        let err = ProviderError::Status {
            status: 500,
            message: "boom".into(),
        }
        .for_provider(Provider::Deezer);
        assert!(matches!(TimeuhError::from(err), TimeuhError::Network(_)));
    }

    #[test]
    fn parse_errors_are_bad_responses() {
        let err: TimeuhError = ProviderError::ParseError("not json".into()).into();
        assert!(matches!(err, TimeuhError::BadResponse(_)));
    }
}
