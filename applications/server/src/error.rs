/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use timeuh_core::TimeuhError;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] TimeuhError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::Core(TimeuhError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Core(TimeuhError::TrackNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Track {} not found", id))
            }
            ServerError::Core(ref e @ TimeuhError::Authorization { .. }) => {
                tracing::warn!("Authorization error: {}", e);
                (StatusCode::UNAUTHORIZED, "Authorization failed".to_string())
            }
            ServerError::Core(ref e @ (TimeuhError::Network(_) | TimeuhError::BadResponse(_))) => {
                tracing::error!("Upstream error: {}", e);
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string())
            }
            ServerError::Core(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
