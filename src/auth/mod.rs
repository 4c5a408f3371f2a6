//! Bearer-token verification against the identity provider's key set, and
//! the failure sub-codes the pipeline exposes to clients.

pub mod jwks;

pub use jwks::{KeySet, KeySetError};

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

// Authentication failure sub-codes (all 403).
pub const CODE_TOKEN_NOT_PROVIDED: u16 = 3001;
pub const CODE_INVALID_TOKEN_FORMAT: u16 = 3002;
pub const CODE_SUBJECT_MISSING: u16 = 3003;
pub const CODE_TOKEN_EXPIRED: u16 = 3004;
pub const CODE_TOKEN_MALFORMED: u16 = 3005;
pub const CODE_CLAIM_REJECTED: u16 = 3006;
pub const CODE_VERIFICATION_FAILED: u16 = 3007;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    email: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Authenticated client identity derived from a verified token.
///
/// Never persisted by the pipeline; lives in the request's `Locals` under
/// `client` for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Verifies RS256 bearer tokens against a realm's key set.
pub struct TokenVerifier {
    issuer: String,
    audience: String,
    keys: Arc<KeySet>,
}

impl TokenVerifier {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, keys: Arc<KeySet>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            keys,
        }
    }

    /// Verify signature and claims, returning the resolved client identity.
    ///
    /// Required issuer is the realm URL; the audience must intersect
    /// {configured audience, "account"} (Keycloak adds "account" to every
    /// access token).
    pub async fn verify(&self, token: &str) -> Result<Client, ApiError> {
        let header = decode_header(token).map_err(map_verification_error)?;
        let kid = header.kid.ok_or_else(|| {
            ApiError::forbidden("token key id missing").with_code(CODE_VERIFICATION_FAILED)
        })?;

        let key = self.keys.key_for(&kid).await.map_err(|e| {
            tracing::warn!("signing key resolution failed: {}", e);
            ApiError::forbidden("unable to verify token").with_code(CODE_VERIFICATION_FAILED)
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[self.audience.as_str(), "account"]);

        let data = decode::<Claims>(token, &key, &validation).map_err(map_verification_error)?;

        let Claims { sub, email, extra } = data.claims;
        let id = sub.ok_or_else(|| {
            ApiError::forbidden("client identifier missing").with_code(CODE_SUBJECT_MISSING)
        })?;

        Ok(Client { id, email, claims: extra })
    }
}

/// Map verification library failures to the distinct Forbidden sub-codes.
fn map_verification_error(e: jsonwebtoken::errors::Error) -> ApiError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::ExpiredSignature => {
            ApiError::forbidden("token expired").with_code(CODE_TOKEN_EXPIRED)
        }
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => {
            ApiError::forbidden("malformed token").with_code(CODE_TOKEN_MALFORMED)
        }
        ErrorKind::InvalidIssuer => {
            ApiError::forbidden("token issuer rejected").with_code(CODE_CLAIM_REJECTED)
        }
        ErrorKind::InvalidAudience => {
            ApiError::forbidden("token audience rejected").with_code(CODE_CLAIM_REJECTED)
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            ApiError::forbidden(format!("required claim '{}' missing", claim))
                .with_code(CODE_CLAIM_REJECTED)
        }
        ErrorKind::ImmatureSignature | ErrorKind::InvalidSubject => {
            ApiError::forbidden("token claims rejected").with_code(CODE_CLAIM_REJECTED)
        }
        _ => ApiError::forbidden("token verification failed").with_code(CODE_VERIFICATION_FAILED),
    }
}
