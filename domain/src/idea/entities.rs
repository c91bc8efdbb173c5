//! Idea entities

use crate::core::ids::{IdeaId, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ordered contribution to a session (Entity)
///
/// Ideas are immutable once appended. An edit is a new idea whose `revises`
/// points at the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: IdeaId,
    /// 1-based, strictly increasing and gap-free within a session
    pub sequence: u64,
    pub contributor: ParticipantId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revises: Option<IdeaId>,
}

impl Idea {
    /// A short single-line preview used in logs and console output.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self.text.lines().next().unwrap_or_default();
        if line.chars().count() <= max_chars {
            line.to_string()
        } else {
            let truncated: String = line.chars().take(max_chars).collect();
            format!("{truncated}…")
        }
    }
}
