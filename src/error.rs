// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::generator::GenerationError;

pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try with fewer questions.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate quiz. Please try again.";

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error, message is shown to the client
    InternalServerError(String),

    // 500, upstream credential missing
    NotConfigured(String),

    // 400 Bad Request
    BadRequest(String),

    // 408 Request Timeout
    Timeout(String),

    // 429 Too Many Requests, raised by the per-IP limiter
    TooManyRequests(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg)
            | AppError::NotConfigured(msg)
            | AppError::BadRequest(msg)
            | AppError::Timeout(msg)
            | AppError::TooManyRequests(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) | AppError::NotConfigured(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a `{ "error": ... }` JSON body with the matching status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                if msg.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    msg
                }
            }
            AppError::NotConfigured(msg) => {
                tracing::error!("Configuration error: {}", msg);
                msg
            }
            AppError::Timeout(msg) => {
                tracing::warn!("Upstream timeout: {}", msg);
                msg
            }
            AppError::TooManyRequests(msg) => {
                tracing::warn!("Rate limited: {}", msg);
                msg
            }
            AppError::BadRequest(msg) => msg,
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts orchestrator failures into HTTP errors.
/// Timeouts keep their own status so the client can suggest fewer questions.
impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout { .. } => AppError::Timeout(TIMEOUT_MESSAGE.to_string()),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}
