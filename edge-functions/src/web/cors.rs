//! CORS handling for browser-facing endpoints.
//!
//! Preflight `OPTIONS` requests are answered directly with `ok`. All other
//! responses get the allow-origin and allow-headers headers appended.

use axum::{
    extract::Request,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Request headers browsers may send cross-origin.
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// CORS middleware, for use with `axum::middleware::from_fn`.
pub async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        debug!(path = %request.uri().path(), "cors_preflight");
        let mut response = (StatusCode::OK, "ok").into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}
