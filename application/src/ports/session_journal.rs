//! Port for the structured session journal.
//!
//! Defines the [`SessionJournal`] trait for recording every broadcast session
//! event (and the context windows the assistant was invoked with) to a
//! machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while the journal captures the full session
//! transcript (JSONL in the file adapter).

use huddle_domain::{SessionEvent, SessionId};
use serde_json::Value;

/// A structured journal record.
pub struct JournalRecord {
    /// Record type (e.g. "idea_appended", "assistant_invoked").
    pub record_type: &'static str,
    pub session_id: SessionId,
    /// JSON payload with record-specific fields.
    pub payload: Value,
}

impl JournalRecord {
    pub fn new(record_type: &'static str, session_id: SessionId, payload: Value) -> Self {
        Self {
            record_type,
            session_id,
            payload,
        }
    }

    /// Journal record for a broadcast event.
    pub fn from_event(session_id: &SessionId, event: &SessionEvent) -> Self {
        let payload = serde_json::to_value(event).unwrap_or(Value::Null);
        Self::new(event.kind(), session_id.clone(), payload)
    }
}

/// Port for writing session journal records.
///
/// `record` is synchronous and infallible so that journaling never disturbs
/// a session; write failures are dropped by the adapter.
pub trait SessionJournal: Send + Sync {
    fn record(&self, record: JournalRecord);
}

/// No-op implementation for tests and when journaling is disabled.
pub struct NoSessionJournal;

impl SessionJournal for NoSessionJournal {
    fn record(&self, _record: JournalRecord) {}
}
