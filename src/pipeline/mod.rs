//! Request pipeline: the per-request side-channel, the stage contract, and
//! the adapter that binds stages into the router.
//!
//! Stages communicate success by contributing data into the request's
//! [`Locals`] rather than terminating the exchange; a failed stage
//! short-circuits the chain with a `{message, code}` body. Controllers are
//! ordinary handlers and always terminate the exchange.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::auth::Client;
use crate::error::ApiError;

/// Data a successful stage hands to the rest of the chain.
pub type Contribution = BTreeMap<String, Value>;

/// Request-scoped key/value store passed between chained stages and the
/// terminal handler.
///
/// Created fresh per request by the adapter and stored in the request's
/// extensions; it is owned exclusively by that request's call chain and is
/// never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Locals {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().ok()?.get(key).cloned()
    }

    /// Merge a stage contribution, keeping only entries with truthy values.
    pub fn merge_truthy(&self, contribution: Contribution) {
        if contribution.is_empty() {
            return;
        }
        if let Ok(mut entries) = self.inner.write() {
            for (key, value) in contribution {
                if is_truthy(&value) {
                    entries.insert(key, value);
                }
            }
        }
    }

    /// Correlation token assigned by the trace stage.
    pub fn trace_id(&self) -> Option<String> {
        match self.get("traceId")? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Authenticated client identity attached by the auth stage.
    pub fn client(&self) -> Option<Client> {
        serde_json::from_value(self.get("client")?).ok()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The envelope handed to pipeline stages, built from the incoming HTTP call.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub method: Method,
    pub path: String,
    /// Raw `Authorization` header, the canonical bearer-token source.
    pub authorization: Option<String>,
    /// Normalized `x-access-token` header. Part of the envelope contract for
    /// stages that take the token out-of-band; the bundled stages read only
    /// `authorization`.
    pub access_token: Option<String>,
    pub locals: Locals,
}

impl PipelineRequest {
    fn from_http(request: &Request, locals: Locals) -> Self {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            authorization: header("authorization"),
            access_token: header("x-access-token"),
            locals,
        }
    }
}

/// A pipeline stage: contributes data and continues the chain on success, or
/// terminates it with a typed error.
///
/// Stages may suspend at I/O boundaries (e.g. a remote key-set fetch) and
/// must not block the runtime. A stage must not touch durable state; its only
/// observable effects are its contribution and log output.
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    async fn handle(&self, request: &PipelineRequest) -> Result<Contribution, ApiError>;
}

/// Adapts a [`Stage`] into a router middleware.
///
/// Ensures the request carries a `Locals`, builds the stage envelope, and on
/// success merges the truthy contribution entries before passing control to
/// the next stage. On failure the error's `{message, code}` body is written
/// and the chain stops.
pub async fn run<S>(State(stage): State<Arc<S>>, mut request: Request, next: Next) -> Response
where
    S: Stage,
{
    let locals = match request.extensions().get::<Locals>() {
        Some(existing) => existing.clone(),
        None => {
            let fresh = Locals::default();
            request.extensions_mut().insert(fresh.clone());
            fresh
        }
    };

    let envelope = PipelineRequest::from_http(&request, locals.clone());
    match stage.handle(&envelope).await {
        Ok(contribution) => {
            locals.merge_truthy(contribution);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}
