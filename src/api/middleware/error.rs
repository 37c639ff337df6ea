//! Unified API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::api::models::ErrorResponse;
use crate::error::IndexerError;

/// API-specific error type.
#[derive(Debug)]
pub enum ApiError {
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Database operation failed.
    DatabaseError(String),
    /// Internal server error.
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                "Rate limit exceeded. Please try again later.".to_string(),
            ),
            Self::DatabaseError(msg) => {
                error!(error = %msg, "Database error in API handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database operation failed".to_string(),
                )
            }
            Self::InternalError(msg) => {
                error!(error = %msg, "Internal error in API handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<IndexerError> for ApiError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::DatabaseError { .. } => Self::DatabaseError(err.to_string()),
            _ => Self::InternalError(err.to_string()),
        }
    }
}
