//! Webhook event dispatch.
//!
//! Routes a parsed [`EventEnvelope`] to its handling branch and records audit
//! entries through an [`AuditSink`](crate::store::AuditSink).
//!
//! ## Dispatch Flow
//!
//! ```text
//! raw body → EventEnvelope::from_slice() → Dispatcher::dispatch() → DispatchOutcome
//! ```

pub mod dispatcher;
pub mod types;

pub use dispatcher::Dispatcher;
pub use types::{AuditRecord, DispatchOutcome, EventEnvelope, EventKind, UNKNOWN_KIND};
