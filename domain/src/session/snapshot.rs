//! Point-in-time view of a session, used for catch-up on reconnect

use super::status::SessionStatus;
use crate::assistant::contribution::AssistantContribution;
use crate::core::ids::SessionId;
use crate::idea::entities::Idea;
use crate::participant::entities::Participant;
use crate::quorum::{RankedIdea, VoteTally};
use serde::{Deserialize, Serialize};

/// Everything a (re)connecting client needs to render the session.
///
/// Built from current state rather than by replaying events, so its cost is
/// bounded by the size of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub title: String,
    pub status: SessionStatus,
    pub last_sequence: u64,
    pub participants: Vec<Participant>,
    pub idea_tail: Vec<Idea>,
    pub tallies: Vec<VoteTally>,
    pub top_rated: Vec<RankedIdea>,
    pub consensus_score: f64,
    pub assistant_tail: Vec<AssistantContribution>,
    pub assistant_pending: bool,
    pub summary_available: bool,
}
