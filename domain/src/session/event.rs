//! Events broadcast to everyone attached to a session

use super::status::SessionStatus;
use crate::assistant::contribution::{AssistantContribution, Feedback, TriggerReason};
use crate::core::error::SessionError;
use crate::core::ids::{ContributionId, IdeaId, ParticipantId};
use crate::idea::entities::Idea;
use crate::participant::entities::{Participant, StatusChange};
use crate::participant::roster::JoinOutcome;
use crate::quorum::VoteChange;
use crate::safety::SafetyReport;
use crate::summary::entities::SessionSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a safety report is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SafetyTarget {
    Idea(IdeaId),
    Contribution(ContributionId),
}

/// Why a pending assistant invocation produced no contribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The session stopped accepting contributions first
    SessionClosed,
    /// The request deadline passed
    DeadlineExceeded,
    /// The capability returned an error
    CapabilityFailed(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::SessionClosed => write!(f, "session closed"),
            DropReason::DeadlineExceeded => write!(f, "deadline exceeded"),
            DropReason::CapabilityFailed(e) => write!(f, "capability failed: {e}"),
        }
    }
}

impl From<&SessionError> for DropReason {
    fn from(error: &SessionError) -> Self {
        match error {
            SessionError::ExternalTimeout => DropReason::DeadlineExceeded,
            SessionError::StaleOperation(_) | SessionError::SessionEnded(_) => {
                DropReason::SessionClosed
            }
            other => DropReason::CapabilityFailed(other.to_string()),
        }
    }
}

/// A change to session state, fanned out to every subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ParticipantJoined {
        participant: Participant,
        outcome: JoinOutcome,
    },
    ParticipantStatusChanged(StatusChange),
    StatusChanged {
        from: SessionStatus,
        to: SessionStatus,
        at: DateTime<Utc>,
    },
    IdeaAppended {
        idea: Idea,
    },
    VoteTallied {
        idea_id: IdeaId,
        voter: ParticipantId,
        change: VoteChange,
        votes: usize,
        consensus_score: f64,
    },
    /// Placeholder published when the suggestion misses the SLA window
    AssistantComposing {
        ticket: u64,
        trigger: TriggerReason,
        at: DateTime<Utc>,
    },
    AssistantContributed {
        ticket: u64,
        contribution: AssistantContribution,
    },
    AssistantDropped {
        ticket: u64,
        reason: DropReason,
    },
    FeedbackRecorded {
        contribution_id: ContributionId,
        participant_id: ParticipantId,
        feedback: Feedback,
    },
    SafetyFlagged {
        target: SafetyTarget,
        report: SafetyReport,
    },
    SummaryReady {
        summary: SessionSummary,
    },
}

impl SessionEvent {
    /// Stable event type name, used as the journal record type.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::ParticipantJoined { .. } => "participant_joined",
            SessionEvent::ParticipantStatusChanged(_) => "participant_status_changed",
            SessionEvent::StatusChanged { .. } => "status_changed",
            SessionEvent::IdeaAppended { .. } => "idea_appended",
            SessionEvent::VoteTallied { .. } => "vote_tallied",
            SessionEvent::AssistantComposing { .. } => "assistant_composing",
            SessionEvent::AssistantContributed { .. } => "assistant_contributed",
            SessionEvent::AssistantDropped { .. } => "assistant_dropped",
            SessionEvent::FeedbackRecorded { .. } => "feedback_recorded",
            SessionEvent::SafetyFlagged { .. } => "safety_flagged",
            SessionEvent::SummaryReady { .. } => "summary_ready",
        }
    }

    /// Whether this event is an observable assistant response to a trigger.
    pub fn answers_ticket(&self, ticket: u64) -> bool {
        match self {
            SessionEvent::AssistantComposing { ticket: t, .. }
            | SessionEvent::AssistantContributed { ticket: t, .. }
            | SessionEvent::AssistantDropped { ticket: t, .. } => *t == ticket,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SessionEvent::StatusChanged {
            from: SessionStatus::Forming,
            to: SessionStatus::Active,
            at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["to"], "active");
        assert_eq!(event.kind(), "status_changed");
    }

    #[test]
    fn test_drop_reason_from_error() {
        assert_eq!(
            DropReason::from(&SessionError::ExternalTimeout),
            DropReason::DeadlineExceeded
        );
        assert_eq!(
            DropReason::from(&SessionError::StaleOperation(SessionStatus::Ending)),
            DropReason::SessionClosed
        );
        assert!(matches!(
            DropReason::from(&SessionError::ExternalFailure("boom".to_string())),
            DropReason::CapabilityFailed(msg) if msg.contains("boom")
        ));
    }

    #[test]
    fn test_answers_ticket() {
        let event = SessionEvent::AssistantDropped {
            ticket: 7,
            reason: DropReason::SessionClosed,
        };
        assert!(event.answers_ticket(7));
        assert!(!event.answers_ticket(8));
    }
}
