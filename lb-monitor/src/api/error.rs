//! API error handling.
//!
//! Provides consistent error responses for the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::Error;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Handlers only fail while serializing a snapshot; anything else is a bug.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Serialization(e) => {
                tracing::error!("Failed to serialize metrics: {}", e);
                ApiError::internal("Failed to serialize metrics")
            }
            other => {
                tracing::error!("Unexpected error: {}", other);
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::internal("boom");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "INTERNAL_ERROR");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_serialization_error_is_internal() {
        let json_err = serde_json::from_str::<u8>("nope").unwrap_err();
        let api_err: ApiError = Error::from(json_err).into();

        assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.message, "Failed to serialize metrics");
    }

    #[test]
    fn test_other_errors_are_internal() {
        for err in [
            Error::config("bad port"),
            Error::Io(std::io::Error::other("disk gone")),
        ] {
            let api_err: ApiError = err.into();
            assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(api_err.code, "INTERNAL_ERROR");
            assert_eq!(api_err.message, "An unexpected error occurred");
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
