use crate::api::response::{ApiResponse, ApiResult};

/// Root liveness probe: bare text, no envelope, no trace log line.
pub async fn root() -> &'static str {
    "ok"
}

/// Authenticated health check.
pub async fn health() -> ApiResult<bool> {
    Ok(ApiResponse::ok(true))
}
