//! Domain error types

use crate::session::status::SessionStatus;
use thiserror::Error;

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Session,
    Participant,
    Idea,
    Contribution,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Session => "session",
            EntityKind::Participant => "participant",
            EntityKind::Idea => "idea",
            EntityKind::Contribution => "assistant contribution",
        };
        f.write_str(name)
    }
}

/// Errors produced by session operations.
///
/// None of these are fatal to the process; each is scoped to one session or
/// one operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Unknown {kind}: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{resource} capacity exceeded (limit {limit}): {remediation}")]
    CapacityExceeded {
        resource: &'static str,
        limit: usize,
        remediation: &'static str,
    },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Session is {0} and no longer accepts participants")]
    SessionEnded(SessionStatus),

    #[error("Session is {0}; operation discarded")]
    StaleOperation(SessionStatus),

    #[error("Participant {0} is not active in this session")]
    NotActive(String),

    #[error("Suggestion capability exceeded its time budget")]
    ExternalTimeout,

    #[error("External capability failed: {0}")]
    ExternalFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SessionError {
    pub fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        SessionError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }

    /// Stale operations are rejected silently from the caller's point of view.
    pub fn is_stale(&self) -> bool {
        matches!(self, SessionError::StaleOperation(_))
    }

    pub fn is_capacity(&self) -> bool {
        matches!(self, SessionError::CapacityExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = SessionError::not_found(EntityKind::Idea, "i-42");
        assert_eq!(error.to_string(), "Unknown idea: i-42");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_capacity_error_carries_remediation() {
        let error = SessionError::CapacityExceeded {
            resource: "participant",
            limit: 10,
            remediation: "join as an observer in a new session",
        };
        assert!(error.is_capacity());
        assert!(error.to_string().contains("limit 10"));
        assert!(error.to_string().contains("observer"));
    }

    #[test]
    fn test_stale_check() {
        assert!(SessionError::StaleOperation(SessionStatus::Ended).is_stale());
        assert!(!SessionError::ExternalTimeout.is_stale());
    }
}
