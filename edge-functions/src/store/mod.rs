//! Backend store for audit records and queries.
//!
//! This module provides:
//! - The two narrow capabilities the handlers need from the database
//! - A REST client for the managed backend's PostgREST API
//! - An in-memory store for tests and local runs
//!
//! ## Architecture
//!
//! ```text
//! Dispatcher → AuditSink::insert ──┐
//!                                  ├→ RestStore → {backend}/rest/v1/<table>
//! Query handler → RecordSource::select ┘
//! ```

pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{BackendKind, Config};
use crate::dispatch::AuditRecord;
use crate::error::Result;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Write side: accepts audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Insert one record into `table`.
    async fn insert(&self, table: &str, record: &AuditRecord) -> Result<()>;
}

/// Read side: returns rows for the query endpoint.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch up to `limit` rows from `table`.
    ///
    /// `authorization` is the caller's own `Authorization` header. When set,
    /// the query runs with the caller's privileges instead of the service key.
    async fn select(
        &self,
        table: &str,
        limit: usize,
        authorization: Option<&str>,
    ) -> Result<Vec<Value>>;
}

/// Both halves of the configured backend.
#[derive(Clone)]
pub struct Backend {
    pub sink: Arc<dyn AuditSink>,
    pub source: Arc<dyn RecordSource>,
}

impl Backend {
    /// Build the backend selected by `config.backend`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.backend {
            BackendKind::Rest => Ok(Self::shared(Arc::new(RestStore::new(config)?))),
            BackendKind::Memory => Ok(Self::shared(Arc::new(MemoryStore::new()))),
        }
    }

    /// Use one store for both reads and writes.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: AuditSink + RecordSource + 'static,
    {
        Self {
            sink: store.clone(),
            source: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_backend_reads_own_writes() {
        let backend = Backend::shared(Arc::new(MemoryStore::new()));
        let record = AuditRecord {
            event_type: "user.created".to_string(),
            payload: serde_json::json!({"type": "user.created"}),
            processed_at: chrono::Utc::now(),
        };

        backend.sink.insert("webhook_logs", &record).await.unwrap();
        let rows = backend.source.select("webhook_logs", 10, None).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["event_type"], "user.created");
    }

    #[test]
    fn test_from_config_memory() {
        let config = Config {
            backend: BackendKind::Memory,
            ..Config::default()
        };
        assert!(Backend::from_config(&config).is_ok());
    }
}
