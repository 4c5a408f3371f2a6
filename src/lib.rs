pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod validation;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::TokenVerifier;
use middleware::{auth::Auth, trace::Trace};

/// Build the full route table.
///
/// Registration is explicit and checked at compile time; there is no runtime
/// route discovery. The trace stage wraps every route (including the root
/// probe); the auth stage guards everything under `/api/v1`.
pub fn app(verifier: Arc<TokenVerifier>) -> Router {
    let trace = Arc::new(Trace);
    let auth = Arc::new(Auth::new(verifier));

    let api_v1 = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/professionals", post(handlers::professionals::create))
        .layer(from_fn_with_state(auth, pipeline::run::<Auth>));

    Router::new()
        .route("/", get(handlers::health::root))
        .nest("/api/v1", api_v1)
        .layer(from_fn_with_state(trace, pipeline::run::<Trace>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
