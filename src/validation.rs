//! Batch request validation.
//!
//! Request types implement [`Validate`] and report every violation in one
//! pass; either the entire input is accepted or the full set of violations is
//! surfaced together. Validators are bound per route through the handler's
//! [`ValidatedJson`] argument, never threaded through the request payload.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub trait Validate {
    /// Collect all violations; empty input fields count once each.
    fn validate(&self) -> Result<(), Vec<String>>;
}

/// Push a violation when the field is absent or blank.
pub fn required(violations: &mut Vec<String>, field: &str, value: Option<&str>) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        violations.push(format!("{} is required", field));
    }
}

/// Push a violation when a present, non-blank value is not a plausible
/// email address. Absence is `required`'s concern, not this one's.
pub fn email_format(violations: &mut Vec<String>, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if !value.trim().is_empty() && !looks_like_email(value.trim()) {
            violations.push(format!("{} must be a valid email address", field));
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// JSON body extractor that runs the type's batch validation.
///
/// Rejects with a single BadRequest whose message enumerates every
/// violation.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        if let Err(violations) = value.validate() {
            return Err(ApiError::bad_request(violations.join("; ")));
        }

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_flags_missing_and_blank() {
        let mut violations = Vec::new();
        required(&mut violations, "name", None);
        required(&mut violations, "email", Some("   "));
        required(&mut violations, "specialty", Some("barber"));
        assert_eq!(violations, vec!["name is required", "email is required"]);
    }

    #[test]
    fn email_format_accepts_plausible_addresses() {
        let mut violations = Vec::new();
        email_format(&mut violations, "email", Some("ana@marquei.com.br"));
        assert!(violations.is_empty());
    }

    #[test]
    fn email_format_rejects_malformed_addresses() {
        for bad in ["no-at-sign", "@missing.local", "user@", "user@nodot", "user@.start"] {
            let mut violations = Vec::new();
            email_format(&mut violations, "email", Some(bad));
            assert_eq!(violations.len(), 1, "expected a violation for {:?}", bad);
        }
    }

    #[test]
    fn email_format_leaves_absence_to_required() {
        let mut violations = Vec::new();
        email_format(&mut violations, "email", None);
        email_format(&mut violations, "email", Some(""));
        assert!(violations.is_empty());
    }
}
