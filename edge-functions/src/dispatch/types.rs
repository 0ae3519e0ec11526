//! Event envelope and audit record types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Tag used when the envelope carries no usable `type` field.
pub const UNKNOWN_KIND: &str = "unknown";

// =============================================================================
// Event Kinds
// =============================================================================

/// Event kinds this receiver knows how to handle.
///
/// Anything else lands in [`EventKind::Unknown`] so that senders can roll out
/// new kinds before the receiver is updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `user.created`
    UserCreated,
    /// `payment.completed`
    PaymentCompleted,
    /// Any other tag, kept verbatim for logging
    Unknown(String),
}

impl EventKind {
    /// Wire tag of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::UserCreated => "user.created",
            EventKind::PaymentCompleted => "payment.completed",
            EventKind::Unknown(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        match tag {
            "user.created" => EventKind::UserCreated,
            "payment.completed" => EventKind::PaymentCompleted,
            other => EventKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// A parsed webhook delivery.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub kind: EventKind,
    /// The whole JSON document as sent
    pub payload: Value,
}

impl EventEnvelope {
    /// Parse a raw request body.
    ///
    /// The body must be valid JSON. The kind comes from the top-level `type`
    /// string; a missing or non-string `type` yields `Unknown("unknown")`.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let payload: Value = serde_json::from_slice(body)?;

        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .map(EventKind::from)
            .unwrap_or_else(|| EventKind::Unknown(UNKNOWN_KIND.to_string()));

        Ok(Self { kind, payload })
    }
}

// =============================================================================
// Audit Records
// =============================================================================

/// Row written to the audit table.
///
/// Field names match the table's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_type: String,
    pub payload: Value,
    pub processed_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record for `envelope`, stamped with the current time.
    pub fn from_envelope(envelope: &EventEnvelope) -> Self {
        Self {
            event_type: envelope.kind.as_str().to_string(),
            payload: envelope.payload.clone(),
            processed_at: Utc::now(),
        }
    }
}

/// Result of dispatching one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Acknowledge receipt to the sender
    pub received: bool,
    /// An audit record was stored
    pub audited: bool,
}

impl DispatchOutcome {
    pub fn received() -> Self {
        Self {
            received: true,
            audited: false,
        }
    }

    pub fn audited() -> Self {
        Self {
            received: true,
            audited: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebhookError;
    use serde_json::json;

    #[test]
    fn test_envelope_known_kind() {
        let envelope =
            EventEnvelope::from_slice(br#"{"type":"user.created","data":{"id":1}}"#).unwrap();

        assert_eq!(envelope.kind, EventKind::UserCreated);
        assert_eq!(envelope.payload["data"]["id"], 1);
    }

    #[test]
    fn test_envelope_unrecognized_kind_is_kept() {
        let envelope = EventEnvelope::from_slice(br#"{"type":"invoice.voided"}"#).unwrap();

        assert_eq!(envelope.kind, EventKind::Unknown("invoice.voided".to_string()));
        assert_eq!(envelope.kind.as_str(), "invoice.voided");
    }

    #[test]
    fn test_envelope_missing_type() {
        let envelope = EventEnvelope::from_slice(br#"{"data":{}}"#).unwrap();
        assert_eq!(envelope.kind, EventKind::Unknown("unknown".to_string()));

        let envelope = EventEnvelope::from_slice(br#"{"type":42}"#).unwrap();
        assert_eq!(envelope.kind, EventKind::Unknown("unknown".to_string()));

        let envelope = EventEnvelope::from_slice(b"[1,2,3]").unwrap();
        assert_eq!(envelope.kind, EventKind::Unknown("unknown".to_string()));
    }

    #[test]
    fn test_envelope_truncated_json() {
        let err = EventEnvelope::from_slice(b"{").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_envelope_empty_body() {
        let err = EventEnvelope::from_slice(b"").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_kind_round_trips_through_tag() {
        for tag in ["user.created", "payment.completed", "custom.kind"] {
            assert_eq!(EventKind::from(tag).as_str(), tag);
        }
    }

    #[test]
    fn test_audit_record_columns() {
        let envelope = EventEnvelope::from_slice(br#"{"type":"user.created"}"#).unwrap();
        let record = AuditRecord::from_envelope(&envelope);

        let row = serde_json::to_value(&record).unwrap();
        assert_eq!(row["event_type"], "user.created");
        assert_eq!(row["payload"], json!({"type": "user.created"}));
        assert!(row["processed_at"].as_str().unwrap().contains('T'));
    }
}
