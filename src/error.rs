//! Error handling for ZoneNet console

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Viewport has no content rectangle yet (native or display size unknown)
    #[error("Viewport not ready: {0}")]
    NotReady(String),

    /// HTTP client error (polling endpoint)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport error (push channel)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Upstream streaming service answered with an unexpected status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Live connection manager is gone (actor task ended)
    #[error("Stream manager unavailable: {0}")]
    ManagerUnavailable(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::NotReady(msg) => (StatusCode::CONFLICT, "NOT_READY", msg.clone()),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::WebSocket(e) => (StatusCode::BAD_GATEWAY, "WEBSOCKET_ERROR", e.to_string()),
            Error::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone()),
            Error::ManagerUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MANAGER_UNAVAILABLE",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
