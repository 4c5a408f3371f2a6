// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Closed error taxonomy for the request pipeline.
///
/// Every variant fixes its HTTP status; `code` is an optional numeric
/// sub-code for fine-grained client handling (e.g. 3001-3007 for the
/// authentication failure cases).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { message: String, code: Option<u16> },

    // 403 Forbidden
    Forbidden { message: String, code: Option<u16> },

    // 404 Not Found
    NotFound { message: String, code: Option<u16> },

    // 500 Internal Server Error
    Internal { message: String, code: Option<u16> },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into(), code: None }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden { message: message.into(), code: None }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound { message: message.into(), code: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal { message: message.into(), code: None }
    }

    /// Attach a numeric application sub-code.
    pub fn with_code(mut self, sub_code: u16) -> Self {
        match &mut self {
            ApiError::BadRequest { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Internal { code, .. } => *code = Some(sub_code),
        }
        self
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. }
            | ApiError::Forbidden { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Internal { message, .. } => message,
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Internal { code, .. } => *code,
        }
    }

    /// Convert to the wire error body: `{message, code?}`.
    pub fn to_json(&self) -> Value {
        match self.code() {
            Some(code) => json!({ "message": self.message(), "code": code }),
            None => json!({ "message": self.message() }),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
