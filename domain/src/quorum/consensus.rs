//! Consensus scoring and idea ranking
//!
//! Rankings are recomputed from the ledger on every call. Sessions are small,
//! and a recomputed ranking can never drift from the votes.

use super::rule::QuorumRule;
use super::vote::VoteLedger;
use crate::core::ids::IdeaId;
use crate::idea::log::IdeaLog;
use serde::{Deserialize, Serialize};

/// An idea with its current vote count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedIdea {
    pub idea_id: IdeaId,
    pub sequence: u64,
    pub votes: usize,
    pub text: String,
}

/// How the headline set of a summary was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadlineBasis {
    /// Ideas that satisfied the consensus rule
    Consensus,
    /// Nothing carried the room; top ideas by raw count
    TopByCount,
}

/// Every idea ordered by vote count (desc), ties broken by earliest sequence.
pub fn rank_ideas(log: &IdeaLog, ledger: &VoteLedger) -> Vec<RankedIdea> {
    let mut ranked: Vec<RankedIdea> = log
        .all()
        .iter()
        .map(|idea| RankedIdea {
            idea_id: idea.id.clone(),
            sequence: idea.sequence,
            votes: ledger.count(&idea.id),
            text: idea.text.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.sequence.cmp(&b.sequence)));
    ranked
}

/// The `k` highest-ranked ideas.
pub fn top_rated(log: &IdeaLog, ledger: &VoteLedger, k: usize) -> Vec<RankedIdea> {
    let mut ranked = rank_ideas(log, ledger);
    ranked.truncate(k);
    ranked
}

/// Leading idea's votes over voting members, clamped to `[0, 1]`.
///
/// Votes cast by members who have since left still count toward the leading
/// idea, hence the clamp.
pub fn consensus_score(log: &IdeaLog, ledger: &VoteLedger, voting_members: usize) -> f64 {
    if voting_members == 0 {
        return 0.0;
    }
    let leading = log
        .all()
        .iter()
        .map(|idea| ledger.count(&idea.id))
        .max()
        .unwrap_or(0);
    (leading as f64 / voting_members as f64).clamp(0.0, 1.0)
}

/// Pick the headline ideas for a summary.
///
/// Ideas satisfying `rule` form the headline; when none do, the first
/// `fallback_k` of the ranking are used instead.
pub fn select_headline(
    ranked: &[RankedIdea],
    voting_members: usize,
    rule: QuorumRule,
    fallback_k: usize,
) -> (Vec<RankedIdea>, HeadlineBasis) {
    let carried: Vec<RankedIdea> = ranked
        .iter()
        .filter(|r| rule.is_satisfied(r.votes, voting_members))
        .cloned()
        .collect();
    if carried.is_empty() {
        (
            ranked.iter().take(fallback_k).cloned().collect(),
            HeadlineBasis::TopByCount,
        )
    } else {
        (carried, HeadlineBasis::Consensus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::ParticipantId;
    use chrono::Utc;

    fn setup(ideas: usize) -> (IdeaLog, VoteLedger, Vec<IdeaId>) {
        let mut log = IdeaLog::new();
        let mut ids = Vec::new();
        for i in 0..ideas {
            let idea = log
                .append(ParticipantId::new("p"), &format!("idea {i}"), None, Utc::now())
                .unwrap();
            ids.push(idea.id.clone());
        }
        (log, VoteLedger::new(), ids)
    }

    fn vote(ledger: &mut VoteLedger, idea: &IdeaId, voter: &str) {
        ledger.cast(idea, &ParticipantId::new(voter), false, Utc::now());
    }

    #[test]
    fn test_three_of_four_gives_075() {
        let (log, mut ledger, ids) = setup(2);
        for voter in ["a", "b", "c"] {
            vote(&mut ledger, &ids[0], voter);
        }
        vote(&mut ledger, &ids[1], "d");

        assert_eq!(consensus_score(&log, &ledger, 4), 0.75);
        let top = top_rated(&log, &ledger, 1);
        assert_eq!(top[0].idea_id, ids[0]);
        assert_eq!(top[0].votes, 3);
    }

    #[test]
    fn test_ties_break_on_earliest_sequence() {
        let (log, mut ledger, ids) = setup(3);
        vote(&mut ledger, &ids[2], "a");
        vote(&mut ledger, &ids[1], "b");

        let ranked = rank_ideas(&log, &ledger);
        let sequences: Vec<u64> = ranked.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 1]);
        assert_eq!(rank_ideas(&log, &ledger), ranked);
    }

    #[test]
    fn test_consensus_with_no_members_is_zero() {
        let (log, ledger, _) = setup(1);
        assert_eq!(consensus_score(&log, &ledger, 0), 0.0);
    }

    #[test]
    fn test_headline_falls_back_to_top_three() {
        let (log, ledger, _) = setup(5);
        let ranked = rank_ideas(&log, &ledger);

        let (headline, basis) = select_headline(&ranked, 2, QuorumRule::Majority, 3);
        assert_eq!(basis, HeadlineBasis::TopByCount);
        let sequences: Vec<u64> = headline.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_headline_uses_ideas_that_carry_the_room() {
        let (log, mut ledger, ids) = setup(3);
        for voter in ["a", "b", "c"] {
            vote(&mut ledger, &ids[1], voter);
        }
        vote(&mut ledger, &ids[0], "a");

        let ranked = rank_ideas(&log, &ledger);
        let (headline, basis) = select_headline(&ranked, 4, QuorumRule::Majority, 3);
        assert_eq!(basis, HeadlineBasis::Consensus);
        assert_eq!(headline.len(), 1);
        assert_eq!(headline[0].idea_id, ids[1]);
    }
}
