//! Error types for the HTTP endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ErrorResponse;

/// A request that ended without the happy-path response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The `/send` body was missing, too large, or not `{"message": "..."}`.
    #[error("Invalid request")]
    InvalidRequest,

    /// No message arrived within the wait window.
    #[error("timeout")]
    Timeout,

    /// A newer poll for the same ID replaced this one.
    #[error("superseded")]
    Superseded,

    /// The server is shutting down.
    #[error("shutting down")]
    ShuttingDown,

    /// The wait task panicked or was aborted.
    #[error("wait aborted: {0}")]
    WaitAborted(#[from] tokio::task::JoinError),
}

impl ApiError {
    /// The status code this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Superseded => StatusCode::CONFLICT,
            ApiError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::WaitAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::WaitAborted(e) = &self {
            tracing::error!(error = %e, "wait task failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
