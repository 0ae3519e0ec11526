//! Webhook signature verification.
//!
//! Senders sign the raw request body with HMAC-SHA256 using the shared secret
//! and put the lowercase hex digest in the `x-webhook-signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::{Result, WebhookError};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex encoded signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Compute the signature a sender would attach to `payload`.
///
/// Returns the 64 character lowercase hex encoding of
/// `HMAC-SHA256(secret, payload)`.
pub fn compute_signature(payload: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::KeyImport(e.to_string()))?;

    mac.update(payload);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook signature.
///
/// # Arguments
///
/// * `payload` - The raw request body, exactly as received
/// * `signature` - The claimed signature from the request header
/// * `secret` - The shared webhook secret
///
/// # Returns
///
/// `true` only if `signature` equals the expected hex digest. Empty inputs
/// and key import failures never verify.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    if signature.is_empty() || secret.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.is_empty(),
            "webhook_signature_missing_fields"
        );
        return false;
    }

    let expected_signature = match compute_signature(payload, secret) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "webhook_signature_invalid_key");
            return false;
        }
    };

    let valid: bool = expected_signature
        .as_bytes()
        .ct_eq(signature.as_bytes())
        .into();

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Decide whether a request has to pass signature verification.
///
/// Verification is skipped only when enforcement is switched off and no
/// secret is configured. Any non-empty secret, whitespace included, is the
/// same key [`verify_signature`] signs with and is always enforced.
pub fn is_signature_verification_enabled(require_signature: bool, secret: &str) -> bool {
    require_signature || !secret.is_empty()
}
