//! Service errors: startup failures and per-request responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paratran_core::TranscribeError;
use serde::Serialize;

/// Failure to bring the service up.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured model could not be loaded.
    #[error("model preload failed: {0}")]
    Preload(#[source] TranscribeError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested bind address.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A startup task panicked or was cancelled.
    #[error("startup task failed: {0}")]
    Task(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}

/// Request failure mapped to an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 500 with `message`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Arbitrary status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<TranscribeError> for ApiError {
    fn from(e: TranscribeError) -> Self {
        if e.is_user_input() {
            Self::bad_request(e.to_string())
        } else {
            Self::internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}
