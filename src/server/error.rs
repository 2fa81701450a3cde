//! Stub API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type for stub handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error answered with an HTTP status and a JSON body
#[derive(Debug, Clone, Serialize, Error)]
pub struct ApiError {
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,

    /// Error message
    pub message: String,

    /// Machine-readable error code
    pub code: &'static str,
}

impl ApiError {
    /// Create an error
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// 404 Not Found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("Resource not found: {}", resource.into()),
            "NOT_FOUND",
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{:?}] [{}] {}", self.status, self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
            "code": self.code,
        }));

        (self.status, body).into_response()
    }
}
