//! Participant entities

use crate::core::ids::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a human plays in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Opened the session
    Initiator,
    /// Contributes ideas and votes
    #[default]
    Contributor,
    /// Read-only; receives broadcasts but cannot contribute or vote
    Observer,
}

impl Role {
    pub fn can_contribute(&self) -> bool {
        !matches!(self, Role::Observer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Contributor => write!(f, "contributor"),
            Role::Observer => write!(f, "observer"),
        }
    }
}

/// Transport-level connection state of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    /// Missed heartbeats; seat is held until the grace window expires
    Disconnected,
    Left,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Left => write!(f, "left"),
        }
    }
}

/// One human attached to a session (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub status: ConnectionStatus,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        display_name: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
            joined_at: now,
            last_heartbeat_at: now,
            status: ConnectionStatus::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Connected or disconnected-within-grace; either way the seat is held.
    pub fn holds_seat(&self) -> bool {
        self.status != ConnectionStatus::Left
    }

    /// Counts toward the consensus denominator.
    pub fn is_voting_member(&self) -> bool {
        self.holds_seat() && self.role.can_contribute()
    }
}

/// A connection-state change produced by roster operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub participant_id: ParticipantId,
    pub from: ConnectionStatus,
    pub to: ConnectionStatus,
    pub at: DateTime<Utc>,
}
