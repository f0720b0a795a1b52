//! Shared request plumbing.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::{ProviderError, Result};

/// HTTP client with the defaults every provider uses
pub(crate) fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(format!("TimeuhMachine/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::Request)
}

/// Parse a configured base URL, dropping any trailing slash
pub(crate) fn base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", raw, e)))?;
    Ok(trimmed.to_string())
}

/// Validate a full endpoint URL, keeping it as written
pub(crate) fn endpoint(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    Url::parse(trimmed).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", raw, e)))?;
    Ok(trimmed.to_string())
}

/// Send a request, turning non-success statuses into errors
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Read a JSON body; `what` names it in the error
pub(crate) async fn json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::ParseError(format!("Failed to parse {}: {}", what, e)))
}
