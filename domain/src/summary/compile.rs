//! Deterministic summary compilation
//!
//! Compilation reads only the final session state plus the extracted action
//! items, never the wall clock, so the same state always produces the same
//! summary.

use super::entities::{ActionItem, ContentBrief, SessionSummary};
use crate::core::error::SessionError;
use crate::quorum::{QuorumRule, consensus_score, rank_ideas, select_headline};
use crate::session::entities::Session;

/// Knobs for summary compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryPolicy {
    pub headline_rule: QuorumRule,
    /// Headline size when no idea satisfies the rule
    pub fallback_headline: usize,
    pub top_rated: usize,
    pub max_highlights: usize,
    pub max_open_questions: usize,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            headline_rule: QuorumRule::Majority,
            fallback_headline: 3,
            top_rated: 5,
            max_highlights: 3,
            max_open_questions: 3,
        }
    }
}

/// Build the summary of a session that is winding down.
///
/// A session that never entered `ending` has no end time; it is rejected with
/// `StaleOperation`.
pub fn compile_summary(
    session: &Session,
    action_items: Vec<ActionItem>,
    action_items_degraded: bool,
    policy: &SummaryPolicy,
) -> Result<SessionSummary, SessionError> {
    let ended_at = session
        .ending_at()
        .ok_or(SessionError::StaleOperation(session.status()))?;
    let started_at = session.started_at();

    let log = session.ideas();
    let ledger = session.votes();
    let voting_members = session.roster().voting_member_count();

    let ranked = rank_ideas(log, ledger);
    let (headline, headline_basis) = select_headline(
        &ranked,
        voting_members,
        policy.headline_rule,
        policy.fallback_headline,
    );
    let top_rated: Vec<_> = ranked.iter().take(policy.top_rated).cloned().collect();

    let flagged_ideas = log
        .all()
        .iter()
        .filter(|idea| {
            session
                .idea_safety(&idea.id)
                .is_some_and(|report| !report.is_clean())
        })
        .map(|idea| idea.id.clone())
        .collect();

    let title = if !session.title().trim().is_empty() {
        session.title().trim().to_string()
    } else if let Some(first) = headline.first().and_then(|h| log.get(&h.idea_id)) {
        first.preview(60)
    } else {
        "Untitled session".to_string()
    };

    let key_points = headline
        .iter()
        .filter_map(|h| log.get(&h.idea_id))
        .map(|idea| {
            let votes = ledger.count(&idea.id);
            format!("{} ({votes} vote{})", idea.preview(120), if votes == 1 { "" } else { "s" })
        })
        .collect();

    let mut contributions: Vec<_> = session.contributions().iter().enumerate().collect();
    contributions.sort_by(|(ia, a), (ib, b)| {
        b.helpful_count()
            .cmp(&a.helpful_count())
            .then(b.confidence.total_cmp(&a.confidence))
            .then(ia.cmp(ib))
    });
    let assistant_highlights = contributions
        .into_iter()
        .take(policy.max_highlights)
        .map(|(_, c)| preview(&c.text, 160))
        .collect();

    let open_questions = log
        .all()
        .iter()
        .filter(|idea| idea.text.trim_end().ends_with('?'))
        .filter(|idea| !headline.iter().any(|h| h.idea_id == idea.id))
        .take(policy.max_open_questions)
        .map(|idea| idea.preview(120))
        .collect();

    Ok(SessionSummary {
        session_id: session.id().clone(),
        workspace_id: session.workspace_id().clone(),
        title: title.clone(),
        started_at,
        ended_at,
        duration_secs: (ended_at - started_at).num_seconds().max(0),
        total_ideas: log.len(),
        total_votes: ledger.total_votes(),
        participant_count: session.roster().len(),
        voting_members,
        consensus_score: consensus_score(log, ledger, voting_members),
        headline_rule: policy.headline_rule,
        headline_basis,
        headline,
        top_rated,
        assistant_contribution_count: session.contributions().len(),
        action_items,
        action_items_degraded,
        flagged_ideas,
        brief: ContentBrief {
            title,
            key_points,
            assistant_highlights,
            open_questions,
        },
    })
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}…", flat.chars().take(max_chars).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ParticipantId, SessionId, WorkspaceId};
    use crate::participant::entities::Role;
    use crate::quorum::HeadlineBasis;
    use crate::session::entities::SessionRules;
    use crate::session::status::SessionStatus;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn session_with(title: &str, members: &[&str]) -> Session {
        let mut s = Session::new(
            SessionId::new("s"),
            WorkspaceId::new("w"),
            title,
            SessionRules::default(),
            t(0),
        );
        for m in members {
            s.join(pid(m), m, Role::Contributor, t(0)).unwrap();
        }
        s
    }

    #[test]
    fn test_requires_ending() {
        let s = session_with("t", &["a"]);
        let err = compile_summary(&s, Vec::new(), false, &SummaryPolicy::default()).unwrap_err();
        assert!(err.is_stale());
    }

    #[test]
    fn test_consensus_headline() {
        let mut s = session_with("Roadmap", &["a", "b", "c", "d"]);
        let x = s.contribute_idea(&pid("a"), "x", None, t(10)).unwrap().value.idea;
        s.contribute_idea(&pid("b"), "y?", None, t(20)).unwrap();
        for v in ["a", "b", "c"] {
            s.vote(&x.id, &pid(v), t(30)).unwrap();
        }
        s.transition(SessionStatus::Ending, t(70)).unwrap();

        let summary = compile_summary(
            &s,
            vec![ActionItem::new("send notes")],
            false,
            &SummaryPolicy::default(),
        )
        .unwrap();

        assert_eq!(summary.title, "Roadmap");
        assert_eq!(summary.duration_secs, 60);
        assert_eq!(summary.total_ideas, 2);
        assert_eq!(summary.total_votes, 3);
        assert_eq!(summary.headline_basis, HeadlineBasis::Consensus);
        assert_eq!(summary.headline.len(), 1);
        assert_eq!(summary.headline[0].idea_id, x.id);
        assert!((summary.consensus_score - 0.75).abs() < 1e-9);
        assert_eq!(summary.brief.open_questions, vec!["y?".to_string()]);
        assert_eq!(summary.action_items.len(), 1);
    }

    #[test]
    fn test_fallback_headline_and_title() {
        let mut s = session_with("  ", &["a", "b", "c", "d"]);
        let first = s.contribute_idea(&pid("a"), "first idea", None, t(1)).unwrap().value.idea;
        for i in 0..3 {
            s.contribute_idea(&pid("b"), &format!("other {i}"), None, t(2 + i)).unwrap();
        }
        s.vote(&first.id, &pid("c"), t(10)).unwrap();
        s.transition(SessionStatus::Ending, t(20)).unwrap();

        let summary = compile_summary(&s, Vec::new(), true, &SummaryPolicy::default()).unwrap();
        assert_eq!(summary.headline_basis, HeadlineBasis::TopByCount);
        assert_eq!(summary.headline.len(), 3);
        assert_eq!(summary.headline[0].idea_id, first.id);
        assert_eq!(summary.title, "first idea");
        assert!(summary.action_items_degraded);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let mut s = session_with("Retro", &["a", "b"]);
        let x = s.contribute_idea(&pid("a"), "x", None, t(1)).unwrap().value.idea;
        s.contribute_idea(&pid("b"), "y", None, t(2)).unwrap();
        s.vote(&x.id, &pid("b"), t(3)).unwrap();
        s.transition(SessionStatus::Ending, t(4)).unwrap();

        let policy = SummaryPolicy::default();
        let a = compile_summary(&s, Vec::new(), false, &policy).unwrap();
        let b = compile_summary(&s, Vec::new(), false, &policy).unwrap();
        assert_eq!(a.to_canonical_json().unwrap(), b.to_canonical_json().unwrap());
    }
}
