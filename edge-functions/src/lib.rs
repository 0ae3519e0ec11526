//! Edge Functions - signed webhook receiver and authenticated query endpoint.
//!
//! This library provides the modules behind the `edge-functions` binary:
//! - `web`: HTTP handlers, signature verification and CORS
//! - `dispatch`: event envelope parsing and routing by event kind
//! - `store`: the backend the handlers read from and write audit records to
//!
//! ## Architecture
//!
//! ```text
//! Webhook → verify signature → parse envelope → Dispatcher → AuditSink → backend
//! Browser → CORS → query handler → RecordSource → backend
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::{AuditDurability, BackendKind, Config};
pub use dispatch::{AuditRecord, DispatchOutcome, Dispatcher, EventEnvelope, EventKind};
pub use error::WebhookError;
pub use store::{AuditSink, Backend, MemoryStore, RecordSource, RestStore};
pub use web::{router, AppState};
