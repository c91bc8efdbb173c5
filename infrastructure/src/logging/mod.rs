//! Logging infrastructure: the structured session journal.
//!
//! Provides [`JsonlSessionJournal`], a JSONL file writer that implements
//! the [`SessionJournal`](huddle_application::SessionJournal) port.

mod jsonl_journal;

pub use jsonl_journal::JsonlSessionJournal;
