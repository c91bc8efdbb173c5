//! Session summary entities

use crate::core::ids::{IdeaId, ParticipantId, SessionId, WorkspaceId};
use crate::quorum::{HeadlineBasis, QuorumRule, RankedIdea};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A follow-up extracted from the idea log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_idea: Option<IdeaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ParticipantId>,
}

impl ActionItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_idea: None,
            owner: None,
        }
    }

    pub fn from_idea(mut self, idea: IdeaId) -> Self {
        self.source_idea = Some(idea);
        self
    }

    pub fn owned_by(mut self, owner: ParticipantId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Structured brief handed to downstream content tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBrief {
    pub title: String,
    pub key_points: Vec<String>,
    pub assistant_highlights: Vec<String>,
    pub open_questions: Vec<String>,
}

/// Terminal artifact of a session (immutable once created)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub total_ideas: usize,
    pub total_votes: usize,
    pub participant_count: usize,
    pub voting_members: usize,
    pub consensus_score: f64,
    pub headline_rule: QuorumRule,
    pub headline_basis: HeadlineBasis,
    pub headline: Vec<RankedIdea>,
    pub top_rated: Vec<RankedIdea>,
    pub assistant_contribution_count: usize,
    pub action_items: Vec<ActionItem>,
    /// True when the extraction capability failed and the list is a fallback
    pub action_items_degraded: bool,
    pub flagged_ideas: Vec<IdeaId>,
    pub brief: ContentBrief,
}

impl SessionSummary {
    /// Canonical JSON rendering; identical state yields identical bytes.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
