//! API error handling
//!
//! Consistent JSON error responses across all endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

/// Structured JSON error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error type that converts to JSON responses
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found
    NotFound(String),
    /// No or expired session
    AuthRequired,
    /// Wrong email or password
    InvalidCredentials,
    /// Mission gated behind an uncompleted level
    LockedLevel(String),
    /// Malformed request data
    BadRequest(String),
    /// Request clashes with current state
    Conflict(String),
    /// Mission operation not valid right now
    InvalidState(String),
    /// Progress could not be saved
    PersistenceFailure(String),
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, String, &'static str) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found"),
            ApiError::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                "auth_required",
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials".to_string(),
                "invalid_credentials",
            ),
            ApiError::LockedLevel(level_id) => (
                StatusCode::FORBIDDEN,
                format!("Mission '{}' is locked", level_id),
                "locked_level",
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "bad_request"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "conflict"),
            ApiError::InvalidState(msg) => (StatusCode::CONFLICT, msg, "invalid_state"),
            ApiError::PersistenceFailure(msg) => {
                error!("Persistence failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to save progress".to_string(),
                    "persistence_failure",
                )
            }
            ApiError::Database(msg) => {
                error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    "database_error",
                )
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "internal_error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::LockedLevel(level_id) = &self {
            warn!("Refused entry to locked mission {}", level_id);
        }

        let (status, error, code) = self.parts();
        let response = ErrorResponse {
            error,
            code: Some(code.to_string()),
        };

        (status, Json(response)).into_response()
    }
}

impl From<common::Error> for ApiError {
    fn from(err: common::Error) -> Self {
        use common::Error;
        match err {
            Error::LockedLevel(level_id) => ApiError::LockedLevel(level_id),
            Error::PersistenceFailure(msg) => ApiError::PersistenceFailure(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::AuthRequired => ApiError::AuthRequired,
            Error::InvalidCredentials => ApiError::InvalidCredentials,
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::InvalidState(msg) => ApiError::InvalidState(msg),
            Error::Database(msg) => ApiError::Database(msg),
            Error::Config(msg) | Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Extension trait to convert Option to NotFound
pub trait OptionExt<T> {
    fn not_found(self, resource: impl Into<String>) -> Result<T, ApiError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn not_found(self, resource: impl Into<String>) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::NotFound(resource.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status() {
        let cases = [
            (common::Error::LockedLevel("level-1".into()), StatusCode::FORBIDDEN),
            (common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (common::Error::AuthRequired, StatusCode::UNAUTHORIZED),
            (common::Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (common::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (common::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (common::Error::InvalidState("x".into()), StatusCode::CONFLICT),
            (common::Error::PersistenceFailure("x".into()), StatusCode::BAD_GATEWAY),
            (common::Error::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (common::Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
