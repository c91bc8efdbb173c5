//! Assistant contributions and the suggestions they are built from

use super::context::ContextWindow;
use crate::core::ids::{ContributionId, IdeaId, ParticipantId};
use crate::idea::log::IdeaLog;
use crate::safety::SafetyReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Raw output of the suggestion capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(default)]
    pub referenced_ideas: Vec<IdeaId>,
    #[serde(default)]
    pub confidence: f64,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, referenced_ideas: Vec<IdeaId>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            referenced_ideas,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Why the assistant was invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerReason {
    Requested { by: ParticipantId },
    Automatic { ideas_since_last: usize },
}

impl std::fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerReason::Requested { by } => write!(f, "requested by {by}"),
            TriggerReason::Automatic { ideas_since_last } => {
                write!(f, "automatic after {ideas_since_last} ideas")
            }
        }
    }
}

/// A participant's reaction to an assistant contribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub helpful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// One published output of the assistant (Entity)
///
/// Immutable once published apart from feedback and safety metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantContribution {
    pub id: ContributionId,
    pub text: String,
    pub referenced_ideas: Vec<IdeaId>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub trigger: TriggerReason,
    /// Highest idea sequence the contribution had seen
    pub after_sequence: u64,
    /// The window the suggestion was generated from, kept for audit
    pub context: ContextWindow,
    #[serde(default)]
    pub feedback: BTreeMap<ParticipantId, Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<SafetyReport>,
}

impl AssistantContribution {
    pub fn helpful_count(&self) -> usize {
        self.feedback.values().filter(|f| f.helpful).count()
    }
}

/// Result of reconciling a suggestion's citations with the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedReferences {
    pub ideas: Vec<IdeaId>,
    /// Citations that named ideas not in the log
    pub discarded: usize,
    /// Citations added from the context window to reach the minimum
    pub added: usize,
}

/// Make a suggestion's citations satisfy the reference requirement.
///
/// Citations of unknown ideas are dropped and duplicates collapsed. If fewer
/// than required remain, the most recent ideas of the window (then of the
/// log) are added until the requirement is met.
pub fn ground_references(
    cited: &[IdeaId],
    window: &ContextWindow,
    log: &IdeaLog,
    required: usize,
) -> GroundedReferences {
    let mut seen = BTreeSet::new();
    let mut ideas = Vec::new();
    let mut discarded = 0;

    for id in cited {
        if log.get(id).is_none() {
            discarded += 1;
            continue;
        }
        if seen.insert(id.clone()) {
            ideas.push(id.clone());
        }
    }

    let mut added = 0;
    let fallback = window
        .idea_ids_newest_first()
        .into_iter()
        .chain(log.all().iter().rev().map(|i| i.id.clone()));
    for id in fallback {
        if ideas.len() >= required {
            break;
        }
        if log.get(&id).is_some() && seen.insert(id.clone()) {
            ideas.push(id);
            added += 1;
        }
    }

    GroundedReferences {
        ideas,
        discarded,
        added,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::SessionId;

    fn setup(n: usize) -> (IdeaLog, ContextWindow) {
        let mut log = IdeaLog::new();
        for i in 0..n {
            log.append(ParticipantId::new("p"), &format!("idea {i}"), None, Utc::now())
                .unwrap();
        }
        let window = ContextWindow::build(&SessionId::new("s"), &log, &[], 10, Utc::now());
        (log, window)
    }

    #[test]
    fn test_valid_citations_are_kept() {
        let (log, window) = setup(5);
        let cited: Vec<IdeaId> = log.all()[..3].iter().map(|i| i.id.clone()).collect();

        let grounded = ground_references(&cited, &window, &log, 3);
        assert_eq!(grounded.ideas, cited);
        assert_eq!(grounded.added, 0);
    }

    #[test]
    fn test_unknown_and_duplicate_citations_are_replaced() {
        let (log, window) = setup(5);
        let first = log.all()[0].id.clone();
        let cited = vec![first.clone(), first.clone(), IdeaId::new("ghost")];

        let grounded = ground_references(&cited, &window, &log, 3);
        assert_eq!(grounded.ideas.len(), 3);
        assert_eq!(grounded.ideas[0], first);
        assert_eq!(grounded.discarded, 1);
        assert_eq!(grounded.added, 2);
        // Top-up prefers the newest ideas
        assert_eq!(grounded.ideas[1], log.all()[4].id);
    }

    #[test]
    fn test_small_sessions_cite_what_exists() {
        let (log, window) = setup(2);
        let grounded = ground_references(&[], &window, &log, window.required_references(3));
        assert_eq!(grounded.ideas.len(), 2);
    }

    #[test]
    fn test_suggestion_confidence_is_clamped() {
        assert_eq!(Suggestion::new("x", vec![], 1.7).confidence, 1.0);
        assert_eq!(Suggestion::new("x", vec![], -0.2).confidence, 0.0);
    }
}
