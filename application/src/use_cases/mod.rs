//! Use cases (application services)
//!
//! - [`registry::SessionRegistry`]: session lookup, creation caps, eviction
//! - [`participants::ParticipantService`]: join, heartbeat, reconnect, leave
//! - [`ideas::IdeaService`] and [`votes::VoteService`]: the hot mutation path
//! - [`assistant::AssistantScheduler`]: SLA-bound assistant invocations
//! - [`summarize::SessionSummarizer`]: end-of-session compilation
//! - [`engine::CollabEngine`]: facade over all of the above

pub mod assistant;
pub mod engine;
pub mod handle;
pub mod ideas;
pub mod maintenance;
pub mod participants;
pub mod registry;
pub mod safety;
pub mod summarize;
pub mod votes;
