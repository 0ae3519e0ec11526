//! HTTP endpoint handlers.
//!
//! The webhook handler runs the full verify → parse → dispatch pipeline and
//! shapes the outcome into a JSON response. The query handler reads a page of
//! rows from the backend on behalf of the caller.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::dispatch::{DispatchOutcome, Dispatcher, EventEnvelope};
use crate::error::{Result, WebhookError};
use crate::store::{Backend, RecordSource};
use crate::web::signature::{
    is_signature_verification_enabled, verify_signature, SIGNATURE_HEADER,
};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
    pub source: Arc<dyn RecordSource>,
}

impl AppState {
    pub fn new(config: Config, backend: Backend) -> Self {
        let dispatcher = Dispatcher::new(backend.sink, &config);
        Self {
            config: Arc::new(config),
            dispatcher,
            source: backend.source,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Webhook acknowledgement.
#[derive(Serialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

/// Query result.
#[derive(Serialize)]
pub struct DataResponse {
    pub data: Vec<Value>,
}

/// Error body shared by all endpoints.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert an error into its status code and JSON body.
fn error_response(err: &WebhookError, expose_details: bool) -> Response {
    let status = err.status();

    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "request_failed");
    } else {
        warn!(status = status.as_u16(), error = %err, "request_rejected");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.public_message(expose_details),
        }),
    )
        .into_response()
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook endpoint.
///
/// This endpoint:
/// 1. Verifies the HMAC signature over the raw body
/// 2. Parses the JSON event envelope
/// 3. Dispatches by event kind
/// 4. Returns `{"received": true}`
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    info!(
        body_length = body.len(),
        has_signature = !signature.is_empty(),
        "webhook_received"
    );

    match process_webhook(&state, signature, &body).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ReceivedResponse {
                received: outcome.received,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e, state.config.expose_error_details),
    }
}

async fn process_webhook(
    state: &AppState,
    signature: &str,
    body: &[u8],
) -> Result<DispatchOutcome> {
    let config = &state.config;

    if is_signature_verification_enabled(config.require_signature, &config.webhook_secret) {
        if !verify_signature(body, signature, &config.webhook_secret) {
            return Err(WebhookError::InvalidSignature);
        }
    } else {
        warn!("webhook_signature_not_configured");
    }

    let envelope = EventEnvelope::from_slice(body)?;

    state.dispatcher.dispatch(envelope).await
}

// =============================================================================
// Query
// =============================================================================

/// Query endpoint.
///
/// Uses the caller's `Authorization` header when present so that row level
/// security applies; otherwise queries with the service role.
pub async fn query(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty());

    info!(
        table = %state.config.query_table,
        has_authorization = authorization.is_some(),
        "query_received"
    );

    let result = state
        .source
        .select(
            &state.config.query_table,
            state.config.query_limit,
            authorization,
        )
        .await;

    match result {
        Ok(rows) => (StatusCode::OK, Json(DataResponse { data: rows })).into_response(),
        Err(e) => error_response(&e, state.config.expose_error_details),
    }
}
