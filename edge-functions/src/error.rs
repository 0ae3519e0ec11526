//! Error types shared by the verifier, dispatcher and backend store.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can abort a webhook or query request.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The shared secret could not be turned into an HMAC key
    #[error("Failed to import signing key: {0}")]
    KeyImport(String),

    /// Signature header missing or not matching the body
    #[error("Invalid signature")]
    InvalidSignature,

    /// Request body is not valid JSON
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Audit sink write failed
    #[error("Failed to persist audit record: {0}")]
    Persistence(String),

    /// Query against the backend failed
    #[error("Backend request failed: {0}")]
    Backend(String),
}

impl WebhookError {
    /// HTTP status the boundary layer answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::KeyImport(_)
            | WebhookError::Persistence(_)
            | WebhookError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    ///
    /// Client errors describe what the caller did wrong. Server errors are
    /// replaced by a generic message unless `expose_details` is set.
    pub fn public_message(&self, expose_details: bool) -> String {
        if expose_details || self.status().is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, WebhookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert_eq!(
            WebhookError::MalformedPayload(malformed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidSignature.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::Persistence("down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::KeyImport("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_server_detail() {
        let err = WebhookError::Backend("connection refused to 10.0.0.3".into());

        assert_eq!(err.public_message(false), "Internal server error");
        assert!(err.public_message(true).contains("10.0.0.3"));
    }

    #[test]
    fn test_public_message_keeps_client_detail() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = WebhookError::MalformedPayload(malformed);

        assert!(err.public_message(false).starts_with("Malformed payload"));
    }
}
