//! Event dispatcher.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::types::{AuditRecord, DispatchOutcome, EventEnvelope, EventKind};
use crate::config::{AuditDurability, Config};
use crate::error::Result;
use crate::store::AuditSink;

/// Routes envelopes to their handling branch.
///
/// New kinds get a variant in [`EventKind`] and an arm in [`Dispatcher::dispatch`];
/// signature checks and response shaping are unaffected.
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn AuditSink>,
    audit_table: String,
    durability: AuditDurability,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn AuditSink>, config: &Config) -> Self {
        Self {
            sink,
            audit_table: config.audit_table.clone(),
            durability: config.audit_durability,
        }
    }

    /// Handle one envelope.
    ///
    /// Only fails when an audit write fails under [`AuditDurability::Required`].
    /// Unknown kinds are acknowledged.
    pub async fn dispatch(&self, envelope: EventEnvelope) -> Result<DispatchOutcome> {
        info!(event_type = %envelope.kind, "webhook_dispatch_start");

        let outcome = match &envelope.kind {
            EventKind::UserCreated => self.audit(&envelope).await?,
            EventKind::PaymentCompleted => {
                info!(event_type = %envelope.kind, "webhook_payment_received");
                DispatchOutcome::received()
            }
            EventKind::Unknown(tag) => {
                info!(event_type = %tag, "webhook_unhandled_event_kind");
                DispatchOutcome::received()
            }
        };

        info!(
            event_type = %envelope.kind,
            audited = outcome.audited,
            "webhook_dispatch_complete"
        );

        Ok(outcome)
    }

    /// Write an audit record, applying the configured durability.
    async fn audit(&self, envelope: &EventEnvelope) -> Result<DispatchOutcome> {
        let record = AuditRecord::from_envelope(envelope);

        match self.sink.insert(&self.audit_table, &record).await {
            Ok(()) => Ok(DispatchOutcome::audited()),
            Err(e) => match self.durability {
                AuditDurability::BestEffort => {
                    warn!(
                        table = %self.audit_table,
                        event_type = %record.event_type,
                        error = %e,
                        "webhook_audit_failed"
                    );
                    Ok(DispatchOutcome::received())
                }
                AuditDurability::Required => {
                    error!(
                        table = %self.audit_table,
                        event_type = %record.event_type,
                        error = %e,
                        "webhook_audit_failed"
                    );
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebhookError;
    use crate::store::MemoryStore;

    fn dispatcher(store: Arc<MemoryStore>, durability: AuditDurability) -> Dispatcher {
        let config = Config {
            audit_durability: durability,
            ..Config::default()
        };
        Dispatcher::new(store, &config)
    }

    fn envelope(body: &str) -> EventEnvelope {
        EventEnvelope::from_slice(body.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_user_created_is_audited() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(store.clone(), AuditDurability::BestEffort);

        let outcome = dispatcher
            .dispatch(envelope(r#"{"type":"user.created","data":{"id":1}}"#))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::audited());

        let rows = store.rows("webhook_logs");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["event_type"], "user.created");
        assert_eq!(rows[0]["payload"]["data"]["id"], 1);
    }

    #[tokio::test]
    async fn test_payment_completed_is_not_audited() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(store.clone(), AuditDurability::BestEffort);

        let outcome = dispatcher
            .dispatch(envelope(r#"{"type":"payment.completed"}"#))
            .await
            .unwrap();

        assert!(outcome.received);
        assert!(!outcome.audited);
        assert!(store.rows("webhook_logs").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_kind_is_acknowledged() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher(store.clone(), AuditDurability::Required);

        for body in [r#"{"type":"subscription.renewed"}"#, r#"{}"#, "null"] {
            let outcome = dispatcher.dispatch(envelope(body)).await.unwrap();
            assert!(outcome.received);
        }
        assert!(store.rows("webhook_logs").is_empty());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_sink_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_inserts(true);
        let dispatcher = dispatcher(store, AuditDurability::BestEffort);

        let outcome = dispatcher
            .dispatch(envelope(r#"{"type":"user.created"}"#))
            .await
            .unwrap();

        assert!(outcome.received);
        assert!(!outcome.audited);
    }

    #[tokio::test]
    async fn test_required_propagates_sink_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_inserts(true);
        let dispatcher = dispatcher(store, AuditDurability::Required);

        let err = dispatcher
            .dispatch(envelope(r#"{"type":"user.created"}"#))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_custom_audit_table() {
        let store = Arc::new(MemoryStore::new());
        let config = Config {
            audit_table: "events_audit".to_string(),
            ..Config::default()
        };
        let dispatcher = Dispatcher::new(store.clone(), &config);

        dispatcher
            .dispatch(envelope(r#"{"type":"user.created"}"#))
            .await
            .unwrap();

        assert_eq!(store.rows("events_audit").len(), 1);
        assert!(store.rows("webhook_logs").is_empty());
    }
}
