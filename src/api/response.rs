use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;

/// Success envelope for terminal (controller) responses.
///
/// Bodies serialize as `{content: ...}` with the chosen status. Construction
/// is pure: identical input always yields an identical envelope.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    content: T,
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn ok(content: T) -> Self {
        Self { content, status: StatusCode::OK }
    }

    /// 201 Created
    pub fn created(content: T) -> Self {
        Self { content, status: StatusCode::CREATED }
    }

    /// 204 No Content (empty body)
    pub fn no_content() -> ApiResponse<()> {
        ApiResponse { content: (), status: StatusCode::NO_CONTENT }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }

        match serde_json::to_value(&self.content) {
            Ok(value) => (self.status, Json(json!({ "content": value }))).into_response(),
            Err(e) => {
                tracing::error!("failed to serialize response content: {}", e);
                ApiError::internal("failed to serialize response").into_response()
            }
        }
    }
}

/// Handler return type: success envelope or typed pipeline error.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_value(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ok_wraps_content() {
        let response = ApiResponse::ok(true).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_value(response).await, json!({ "content": true }));
    }

    #[tokio::test]
    async fn created_keeps_status_and_envelope() {
        let response = ApiResponse::created(json!({ "id": 1 })).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_value(response).await, json!({ "content": { "id": 1 } }));
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let response = ApiResponse::<()>::no_content().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
