//! Vote ledger for idea endorsements
//!
//! This module defines the voting primitives used to endorse ideas. A vote is
//! keyed by (voter, idea); casting it again never counts twice.

use crate::core::ids::{IdeaId, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single participant's endorsement of one idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: ParticipantId,
    pub idea: IdeaId,
    pub cast_at: DateTime<Utc>,
}

/// What a vote or unvote call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChange {
    Counted,
    /// Repeat vote with toggling disabled: nothing changed
    AlreadyCounted,
    Retracted,
    /// Unvote for a vote that did not exist: nothing changed
    NotPresent,
}

impl VoteChange {
    pub fn is_noop(&self) -> bool {
        matches!(self, VoteChange::AlreadyCounted | VoteChange::NotPresent)
    }
}

/// Current vote count for one idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub idea_id: IdeaId,
    pub votes: usize,
}

/// All active votes of a session, grouped by idea
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteLedger {
    by_idea: BTreeMap<IdeaId, BTreeMap<ParticipantId, DateTime<Utc>>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cast a vote.
    ///
    /// With `toggle` set, a repeat vote retracts the existing one instead of
    /// being ignored.
    pub fn cast(
        &mut self,
        idea: &IdeaId,
        voter: &ParticipantId,
        toggle: bool,
        now: DateTime<Utc>,
    ) -> VoteChange {
        let voters = self.by_idea.entry(idea.clone()).or_default();
        if voters.contains_key(voter) {
            if toggle {
                voters.remove(voter);
                return VoteChange::Retracted;
            }
            return VoteChange::AlreadyCounted;
        }
        voters.insert(voter.clone(), now);
        VoteChange::Counted
    }

    /// Retract a vote. Retracting a missing vote is a no-op.
    pub fn retract(&mut self, idea: &IdeaId, voter: &ParticipantId) -> VoteChange {
        match self.by_idea.get_mut(idea).and_then(|v| v.remove(voter)) {
            Some(_) => VoteChange::Retracted,
            None => VoteChange::NotPresent,
        }
    }

    pub fn count(&self, idea: &IdeaId) -> usize {
        self.by_idea.get(idea).map(|v| v.len()).unwrap_or(0)
    }

    pub fn tally(&self, idea: &IdeaId) -> VoteTally {
        VoteTally {
            idea_id: idea.clone(),
            votes: self.count(idea),
        }
    }

    pub fn has_voted(&self, idea: &IdeaId, voter: &ParticipantId) -> bool {
        self.by_idea
            .get(idea)
            .is_some_and(|voters| voters.contains_key(voter))
    }

    pub fn total_votes(&self) -> usize {
        self.by_idea.values().map(|v| v.len()).sum()
    }

    /// Active votes on one idea, ordered by voter id.
    pub fn votes_for(&self, idea: &IdeaId) -> Vec<Vote> {
        self.by_idea
            .get(idea)
            .map(|voters| {
                voters
                    .iter()
                    .map(|(voter, cast_at)| Vote {
                        voter: voter.clone(),
                        idea: idea.clone(),
                        cast_at: *cast_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (IdeaId, ParticipantId) {
        (IdeaId::new("idea-a"), ParticipantId::new("ann"))
    }

    #[test]
    fn test_repeat_vote_counts_once() {
        let (idea, voter) = ids();
        let mut ledger = VoteLedger::new();

        assert_eq!(ledger.cast(&idea, &voter, false, Utc::now()), VoteChange::Counted);
        assert_eq!(
            ledger.cast(&idea, &voter, false, Utc::now()),
            VoteChange::AlreadyCounted
        );
        assert_eq!(ledger.count(&idea), 1);
    }

    #[test]
    fn test_toggle_retracts_on_repeat() {
        let (idea, voter) = ids();
        let mut ledger = VoteLedger::new();

        ledger.cast(&idea, &voter, true, Utc::now());
        assert_eq!(ledger.cast(&idea, &voter, true, Utc::now()), VoteChange::Retracted);
        assert_eq!(ledger.count(&idea), 0);
    }

    #[test]
    fn test_repeated_unvote_never_goes_negative() {
        let (idea, voter) = ids();
        let mut ledger = VoteLedger::new();
        ledger.cast(&idea, &voter, false, Utc::now());

        assert_eq!(ledger.retract(&idea, &voter), VoteChange::Retracted);
        assert_eq!(ledger.retract(&idea, &voter), VoteChange::NotPresent);
        assert_eq!(ledger.retract(&IdeaId::new("other"), &voter), VoteChange::NotPresent);
        assert_eq!(ledger.count(&idea), 0);
        assert_eq!(ledger.total_votes(), 0);
    }

    #[test]
    fn test_votes_for_lists_voters() {
        let (idea, voter) = ids();
        let mut ledger = VoteLedger::new();
        ledger.cast(&idea, &voter, false, Utc::now());
        ledger.cast(&idea, &ParticipantId::new("bo"), false, Utc::now());

        let votes = ledger.votes_for(&idea);
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].voter.as_str(), "ann");
        assert!(ledger.has_voted(&idea, &voter));
    }
}
