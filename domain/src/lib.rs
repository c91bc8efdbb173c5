//! Domain layer for huddle
//!
//! This crate contains the core rules of a collaborative session: who is in
//! it, what was said, how the group voted, when the assistant speaks and what
//! the final summary says. It has no dependencies on async runtimes,
//! infrastructure or presentation concerns; every operation takes the
//! current time as an argument.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A [`Session`] moves through `forming → active → ending → ended`. Ideas and
//! votes are accepted until wind-down begins; the summary is attached exactly
//! once, on the way to `ended`.
//!
//! ## Quorum
//!
//! Votes are counted per idea, one per participant. The consensus score is
//! the share of voting members backing the top idea, and the summary headline
//! is chosen by a [`QuorumRule`].

pub mod assistant;
pub mod config;
pub mod core;
pub mod idea;
pub mod participant;
pub mod quorum;
pub mod safety;
pub mod session;
pub mod summary;

// Re-export commonly used types
pub use assistant::{
    context::{ContextEntry, ContextWindow},
    contribution::{AssistantContribution, Feedback, Suggestion, TriggerReason, ground_references},
    trigger::{AutoTriggerPolicy, TriggerState},
};
pub use config::OutputFormat;
pub use core::{
    error::{EntityKind, SessionError},
    ids::{ContributionId, IdeaId, ParticipantId, SessionId, WorkspaceId},
};
pub use idea::{entities::Idea, log::IdeaLog};
pub use participant::{
    entities::{ConnectionStatus, Participant, Role, StatusChange},
    roster::{HeartbeatPolicy, JoinOutcome, ReconnectOutcome, Roster},
};
pub use safety::SafetyReport;
pub use session::{
    entities::{Applied, IdeaAccepted, PendingAssistant, Session, SessionRules},
    event::{DropReason, SafetyTarget, SessionEvent},
    snapshot::SessionSnapshot,
    status::SessionStatus,
};
pub use summary::{
    compile::{SummaryPolicy, compile_summary},
    entities::{ActionItem, ContentBrief, SessionSummary},
};

// Re-export quorum types
pub use quorum::{
    HeadlineBasis, QuorumRule, RankedIdea, Vote, VoteChange, VoteLedger, VoteTally,
    consensus_score, rank_ideas, select_headline, top_rated,
};
