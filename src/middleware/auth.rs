use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{self, Client, TokenVerifier};
use crate::error::ApiError;
use crate::pipeline::{Contribution, PipelineRequest, Stage};

/// Authentication stage: a pure gate in front of protected routes.
///
/// On success contributes `{client}` to the request's locals; every failure
/// path logs the trace id, message and sub-code before short-circuiting.
pub struct Auth {
    verifier: Arc<TokenVerifier>,
}

impl Auth {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }

    async fn authenticate(&self, request: &PipelineRequest) -> Result<Client, ApiError> {
        let header = request.authorization.as_deref().ok_or_else(|| {
            ApiError::forbidden("token not provided").with_code(auth::CODE_TOKEN_NOT_PROVIDED)
        })?;

        let token = extract_bearer(header).ok_or_else(|| {
            ApiError::forbidden("invalid token format").with_code(auth::CODE_INVALID_TOKEN_FORMAT)
        })?;

        self.verifier.verify(token).await
    }
}

#[async_trait]
impl Stage for Auth {
    async fn handle(&self, request: &PipelineRequest) -> Result<Contribution, ApiError> {
        match self.authenticate(request).await {
            Ok(client) => {
                let identity = serde_json::to_value(&client)
                    .map_err(|e| ApiError::internal(format!("failed to encode client identity: {}", e)))?;
                let mut contribution = Contribution::new();
                contribution.insert("client".to_string(), identity);
                Ok(contribution)
            }
            Err(error) => {
                tracing::warn!(
                    trace_id = %request.locals.trace_id().unwrap_or_default(),
                    code = ?error.code(),
                    "authentication rejected: {}",
                    error.message()
                );
                Err(error)
            }
        }
    }
}

/// Split the header into scheme and token on a single space.
fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme != "Bearer" || token.trim().is_empty() {
        return None;
    }
    Some(token)
}
