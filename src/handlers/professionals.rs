use axum::Extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::pipeline::Locals;
use crate::validation::{self, Validate, ValidatedJson};

#[derive(Debug, Deserialize)]
pub struct CreateProfessional {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl Validate for CreateProfessional {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        validation::required(&mut violations, "name", self.name.as_deref());
        validation::required(&mut violations, "email", self.email.as_deref());
        validation::email_format(&mut violations, "email", self.email.as_deref());
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Professional {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create(
    Extension(locals): Extension<Locals>,
    ValidatedJson(input): ValidatedJson<CreateProfessional>,
) -> ApiResult<Professional> {
    let client = locals
        .client()
        .ok_or_else(|| ApiError::forbidden("authentication required"))?;

    let professional = Professional {
        id: Uuid::new_v4(),
        // validated above: both fields are present and non-blank
        name: input.name.unwrap_or_default(),
        email: input.email.unwrap_or_default(),
        specialty: input.specialty,
        created_by: client.id.clone(),
        created_at: Utc::now(),
    };

    tracing::info!(
        trace_id = %locals.trace_id().unwrap_or_default(),
        client_id = %client.id,
        professional_id = %professional.id,
        "professional created"
    );

    Ok(ApiResponse::created(professional))
}
