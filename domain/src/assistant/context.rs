//! Context windows for assistant invocations
//!
//! A window is the bounded, most recent slice of the session: ideas and prior
//! assistant contributions interleaved by sequence. Every published
//! contribution keeps a copy of the window that produced it.

use super::contribution::AssistantContribution;
use crate::core::ids::{ContributionId, IdeaId, ParticipantId, SessionId};
use crate::idea::log::IdeaLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a context window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextEntry {
    Idea {
        idea_id: IdeaId,
        sequence: u64,
        contributor: ParticipantId,
        text: String,
    },
    Assistant {
        contribution_id: ContributionId,
        /// Last idea sequence the contribution had seen
        after_sequence: u64,
        text: String,
    },
}

impl ContextEntry {
    /// Position in the interleaved order: ideas sort by their sequence, an
    /// assistant entry sorts right after the idea it followed.
    fn order_key(&self) -> (u64, u8) {
        match self {
            ContextEntry::Idea { sequence, .. } => (*sequence, 0),
            ContextEntry::Assistant { after_sequence, .. } => (*after_sequence, 1),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ContextEntry::Idea { text, .. } | ContextEntry::Assistant { text, .. } => text,
        }
    }
}

/// Snapshot of recent session content handed to the suggestion capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub session_id: SessionId,
    pub built_at: DateTime<Utc>,
    /// Highest idea sequence visible when the window was built
    pub through_sequence: u64,
    /// Total ideas in the session at build time (not just in the window)
    pub session_idea_count: usize,
    pub entries: Vec<ContextEntry>,
}

impl ContextWindow {
    /// Build a window of at most `size` entries.
    pub fn build(
        session_id: &SessionId,
        log: &IdeaLog,
        contributions: &[AssistantContribution],
        size: usize,
        now: DateTime<Utc>,
    ) -> Self {
        // Only the newest `size` of each kind can make it into the window.
        let mut entries: Vec<ContextEntry> = log
            .tail(size)
            .iter()
            .map(|idea| ContextEntry::Idea {
                idea_id: idea.id.clone(),
                sequence: idea.sequence,
                contributor: idea.contributor.clone(),
                text: idea.text.clone(),
            })
            .collect();
        let skip = contributions.len().saturating_sub(size);
        entries.extend(contributions[skip..].iter().map(|c| ContextEntry::Assistant {
            contribution_id: c.id.clone(),
            after_sequence: c.after_sequence,
            text: c.text.clone(),
        }));
        // Stable sort keeps publication order among contributions that
        // followed the same idea.
        entries.sort_by_key(|e| e.order_key());
        let overflow = entries.len().saturating_sub(size);
        entries.drain(..overflow);

        Self {
            session_id: session_id.clone(),
            built_at: now,
            through_sequence: log.last_sequence(),
            session_idea_count: log.len(),
            entries,
        }
    }

    /// Idea ids in the window, newest first.
    pub fn idea_ids_newest_first(&self) -> Vec<IdeaId> {
        self.entries
            .iter()
            .rev()
            .filter_map(|e| match e {
                ContextEntry::Idea { idea_id, .. } => Some(idea_id.clone()),
                ContextEntry::Assistant { .. } => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct ideas a response must cite.
    pub fn required_references(&self, min_references: usize) -> usize {
        min_references.min(self.session_idea_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::contribution::TriggerReason;

    fn log_with(n: usize) -> IdeaLog {
        let mut log = IdeaLog::new();
        for i in 0..n {
            log.append(ParticipantId::new("p"), &format!("idea {}", i + 1), None, Utc::now())
                .unwrap();
        }
        log
    }

    fn contribution(after_sequence: u64, text: &str) -> AssistantContribution {
        AssistantContribution {
            id: ContributionId::generate(),
            text: text.to_string(),
            referenced_ideas: vec![],
            confidence: 0.5,
            created_at: Utc::now(),
            trigger: TriggerReason::Automatic { ideas_since_last: 5 },
            after_sequence,
            context: ContextWindow::build(&SessionId::new("s"), &IdeaLog::new(), &[], 10, Utc::now()),
            feedback: Default::default(),
            safety: None,
        }
    }

    #[test]
    fn test_window_interleaves_by_sequence() {
        let log = log_with(4);
        let contributions = vec![contribution(2, "assistant after two")];
        let window = ContextWindow::build(&SessionId::new("s"), &log, &contributions, 10, Utc::now());

        let texts: Vec<&str> = window.entries.iter().map(|e| e.text()).collect();
        assert_eq!(
            texts,
            vec!["idea 1", "idea 2", "assistant after two", "idea 3", "idea 4"]
        );
        assert_eq!(window.through_sequence, 4);
    }

    #[test]
    fn test_window_keeps_most_recent_entries() {
        let log = log_with(12);
        let contributions = vec![contribution(11, "late note")];
        let window = ContextWindow::build(&SessionId::new("s"), &log, &contributions, 10, Utc::now());

        assert_eq!(window.entries.len(), 10);
        assert_eq!(window.entries[0].text(), "idea 4");
        assert_eq!(window.entries[9].text(), "idea 12");
        assert_eq!(window.session_idea_count, 12);
    }

    #[test]
    fn test_required_references_relax_for_small_sessions() {
        let window = ContextWindow::build(&SessionId::new("s"), &log_with(2), &[], 10, Utc::now());
        assert_eq!(window.required_references(3), 2);

        let window = ContextWindow::build(&SessionId::new("s"), &log_with(7), &[], 10, Utc::now());
        assert_eq!(window.required_references(3), 3);
    }
}
