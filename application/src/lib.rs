//! Application layer for huddle
//!
//! This crate contains the session engine's use cases, port definitions and
//! runtime configuration. It depends only on the domain layer; adapters for
//! the ports live in the infrastructure crate.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::EngineConfig;
pub use ports::{
    action_items::{ActionItemExtractor, NoActionItems},
    capability::CapabilityError,
    clock::{Clock, ManualClock, SystemClock},
    safety_scanner::{NoSafetyScan, SafetyScanner, SafetyVerdict},
    session_journal::{JournalRecord, NoSessionJournal, SessionJournal},
    suggestion::SuggestionProvider,
};
pub use use_cases::{
    assistant::{AssistantScheduler, Invocation, InvocationOutcome},
    engine::{CollabEngine, CollabEngineBuilder},
    handle::SessionHandle,
    participants::{JoinRequest, Joined},
    registry::{CreateSession, SessionRegistry},
    summarize::SessionSummarizer,
};
