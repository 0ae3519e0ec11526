//! In-memory store.
//!
//! Tables are plain vectors of JSON rows behind a mutex. Nothing survives a
//! restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{AuditSink, RecordSource};
use crate::dispatch::AuditRecord;
use crate::error::{Result, WebhookError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail, to exercise durability handling.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Append rows to `table` directly.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Snapshot of all rows in `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn insert(&self, table: &str, record: &AuditRecord) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(WebhookError::Persistence(format!(
                "insert into {} rejected",
                table
            )));
        }

        let row = serde_json::to_value(record)
            .map_err(|e| WebhookError::Persistence(e.to_string()))?;
        self.seed(table, [row]);

        info!(table = table, event_type = %record.event_type, "memory_store_inserted");
        Ok(())
    }
}

#[async_trait]
impl RecordSource for MemoryStore {
    async fn select(
        &self,
        table: &str,
        limit: usize,
        _authorization: Option<&str>,
    ) -> Result<Vec<Value>> {
        Ok(self.rows(table).into_iter().take(limit).collect())
    }
}
