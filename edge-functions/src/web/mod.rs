//! Web server module.
//!
//! This module provides:
//! - `POST /webhook`: signed webhook receiver with event dispatch
//! - `GET|POST /query`: CORS-enabled query endpoint
//! - `GET /health`: liveness probe

pub mod cors;
pub mod handlers;
pub mod signature;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, query, webhook, AppState, DataResponse, ErrorResponse, HealthResponse,
    ReceivedResponse,
};
pub use signature::{
    compute_signature, is_signature_verification_enabled, verify_signature, SIGNATURE_HEADER,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/query", get(query).post(query).layer(from_fn(cors::cors)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
