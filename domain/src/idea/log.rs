//! Append-only idea ledger
//!
//! The log assigns sequence numbers itself, so ordering cannot be broken by a
//! caller. Entries are never reordered or removed.

use super::entities::Idea;
use crate::core::error::{EntityKind, SessionError};
use crate::core::ids::{ContributionId, IdeaId, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on idea text, in characters
pub const MAX_IDEA_CHARS: usize = 4_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdeaLog {
    ideas: Vec<Idea>,
    /// Back-references from ideas to the assistant contributions citing them.
    /// Kept beside the ideas so the ideas themselves stay immutable.
    cited_by: BTreeMap<IdeaId, BTreeSet<ContributionId>>,
}

impl IdeaLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an idea with the next sequence number.
    pub fn append(
        &mut self,
        contributor: ParticipantId,
        text: &str,
        revises: Option<IdeaId>,
        now: DateTime<Utc>,
    ) -> Result<&Idea, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidInput("idea text is empty".to_string()));
        }
        if text.chars().count() > MAX_IDEA_CHARS {
            return Err(SessionError::InvalidInput(format!(
                "idea text exceeds {MAX_IDEA_CHARS} characters"
            )));
        }
        if let Some(original) = &revises
            && self.get(original).is_none()
        {
            return Err(SessionError::not_found(EntityKind::Idea, original));
        }

        let idea = Idea {
            id: IdeaId::generate(),
            sequence: self.last_sequence() + 1,
            contributor,
            text: text.to_string(),
            created_at: now,
            revises,
        };
        self.ideas.push(idea);
        Ok(&self.ideas[self.ideas.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    /// Sequence number of the newest idea, 0 when empty.
    pub fn last_sequence(&self) -> u64 {
        self.ideas.last().map(|i| i.sequence).unwrap_or(0)
    }

    pub fn get(&self, id: &IdeaId) -> Option<&Idea> {
        self.ideas.iter().find(|i| &i.id == id)
    }

    /// Lookup by sequence; sequences are dense so this is an index.
    pub fn by_sequence(&self, sequence: u64) -> Option<&Idea> {
        if sequence == 0 {
            return None;
        }
        self.ideas.get((sequence - 1) as usize)
    }

    pub fn all(&self) -> &[Idea] {
        &self.ideas
    }

    /// The `n` most recent ideas, oldest first.
    pub fn tail(&self, n: usize) -> &[Idea] {
        let start = self.ideas.len().saturating_sub(n);
        &self.ideas[start..]
    }

    /// Ideas with a sequence strictly greater than `sequence`.
    pub fn since(&self, sequence: u64) -> &[Idea] {
        let start = (sequence as usize).min(self.ideas.len());
        &self.ideas[start..]
    }

    pub fn record_citation(&mut self, idea: &IdeaId, contribution: &ContributionId) {
        self.cited_by
            .entry(idea.clone())
            .or_default()
            .insert(contribution.clone());
    }

    pub fn citations(&self, idea: &IdeaId) -> Vec<ContributionId> {
        self.cited_by
            .get(idea)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(log: &mut IdeaLog, text: &str) -> Idea {
        log.append(ParticipantId::new("p"), text, None, Utc::now())
            .unwrap()
            .clone()
    }

    #[test]
    fn test_sequences_are_dense_and_increasing() {
        let mut log = IdeaLog::new();
        for i in 0..5 {
            append(&mut log, &format!("idea {i}"));
        }
        let sequences: Vec<u64> = log.all().iter().map(|i| i.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(log.by_sequence(3).unwrap().text, "idea 2");
    }

    #[test]
    fn test_tail_returns_most_recent_in_order() {
        let mut log = IdeaLog::new();
        for i in 0..5 {
            append(&mut log, &format!("idea {i}"));
        }
        let tail: Vec<&str> = log.tail(2).iter().map(|i| i.text.as_str()).collect();
        assert_eq!(tail, vec!["idea 3", "idea 4"]);
        assert_eq!(log.tail(50).len(), 5);
    }

    #[test]
    fn test_since_returns_later_entries() {
        let mut log = IdeaLog::new();
        for i in 0..4 {
            append(&mut log, &format!("idea {i}"));
        }
        assert_eq!(log.since(2).len(), 2);
        assert_eq!(log.since(2)[0].sequence, 3);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_rejects_blank_text() {
        let mut log = IdeaLog::new();
        let err = log
            .append(ParticipantId::new("p"), "   ", None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_revision_must_reference_existing_idea() {
        let mut log = IdeaLog::new();
        let original = append(&mut log, "first draft");

        let revised = log
            .append(
                ParticipantId::new("p"),
                "second draft",
                Some(original.id.clone()),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(revised.revises.as_ref(), Some(&original.id));

        let err = log
            .append(
                ParticipantId::new("p"),
                "orphan",
                Some(IdeaId::new("missing")),
                Utc::now(),
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
