//! Session lifecycle status

use serde::{Deserialize, Serialize};

/// Lifecycle status of a session.
///
/// Status only moves forward: `forming → active → ending → ended`.
/// A session may end before it ever became active (`forming → ending`),
/// but `ended` is only reachable through `ending`, where the summary is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Forming,
    Active,
    Ending,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Forming => "forming",
            SessionStatus::Active => "active",
            SessionStatus::Ending => "ending",
            SessionStatus::Ended => "ended",
        }
    }

    /// Whether the edge `self → target` is a legal forward move.
    pub fn can_transition_to(&self, target: SessionStatus) -> bool {
        matches!(
            (self, target),
            (SessionStatus::Forming, SessionStatus::Active)
                | (SessionStatus::Forming, SessionStatus::Ending)
                | (SessionStatus::Active, SessionStatus::Ending)
                | (SessionStatus::Ending, SessionStatus::Ended)
        )
    }

    /// Ideas, votes and assistant output are only accepted before wind-down.
    pub fn accepts_contributions(&self) -> bool {
        matches!(self, SessionStatus::Forming | SessionStatus::Active)
    }

    pub fn accepts_participants(&self) -> bool {
        self.accepts_contributions()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Ended)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forming" => Ok(SessionStatus::Forming),
            "active" => Ok(SessionStatus::Active),
            "ending" => Ok(SessionStatus::Ending),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges_allowed() {
        assert!(SessionStatus::Forming.can_transition_to(SessionStatus::Active));
        assert!(SessionStatus::Active.can_transition_to(SessionStatus::Ending));
        assert!(SessionStatus::Ending.can_transition_to(SessionStatus::Ended));
        assert!(SessionStatus::Forming.can_transition_to(SessionStatus::Ending));
    }

    #[test]
    fn test_backward_and_skipping_edges_rejected() {
        assert!(!SessionStatus::Active.can_transition_to(SessionStatus::Forming));
        assert!(!SessionStatus::Ended.can_transition_to(SessionStatus::Active));
        assert!(!SessionStatus::Active.can_transition_to(SessionStatus::Ended));
        assert!(!SessionStatus::Forming.can_transition_to(SessionStatus::Ended));
        assert!(!SessionStatus::Active.can_transition_to(SessionStatus::Active));
    }

    #[test]
    fn test_contribution_window() {
        assert!(SessionStatus::Forming.accepts_contributions());
        assert!(SessionStatus::Active.accepts_contributions());
        assert!(!SessionStatus::Ending.accepts_contributions());
        assert!(!SessionStatus::Ended.accepts_contributions());
    }

    #[test]
    fn test_parse_roundtrip() {
        let status: SessionStatus = "Ending".parse().unwrap();
        assert_eq!(status, SessionStatus::Ending);
        assert!("paused".parse::<SessionStatus>().is_err());
    }
}
