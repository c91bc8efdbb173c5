//! Participant roster for one session
//!
//! Tracks who is attached, enforces the seat cap and derives connection-state
//! changes from heartbeat timestamps. The roster never touches ideas or votes.

use super::entities::{ConnectionStatus, Participant, Role, StatusChange};
use crate::core::error::{EntityKind, SessionError};
use crate::core::ids::ParticipantId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Heartbeat timing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatPolicy {
    pub interval: TimeDelta,
    pub missed_before_disconnect: u32,
    pub grace: TimeDelta,
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        Self {
            interval: TimeDelta::seconds(30),
            missed_before_disconnect: 2,
            grace: TimeDelta::minutes(5),
        }
    }
}

impl HeartbeatPolicy {
    /// Silence after which a connected participant counts as disconnected.
    pub fn disconnect_after(&self) -> TimeDelta {
        self.interval * self.missed_before_disconnect as i32
    }

    /// Silence after which a disconnected participant is considered gone.
    pub fn leave_after(&self) -> TimeDelta {
        self.disconnect_after() + self.grace
    }

    /// Whether the grace window has run out for someone last heard at `last_seen`.
    pub fn has_lapsed(&self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_seen >= self.leave_after()
    }
}

/// What `join` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    Joined,
    /// A participant who had left took a seat again
    Rejoined,
    /// A disconnected participant came back through `join`
    Reconnected,
    AlreadyConnected,
}

/// What `reconnect` (or a heartbeat from a disconnected client) did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectOutcome {
    Restored,
    AlreadyConnected,
}

/// Participants of one session, in join order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant, SessionError> {
        self.participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| SessionError::not_found(EntityKind::Participant, id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn connected_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_connected()).count()
    }

    pub fn seated_count(&self) -> usize {
        self.participants.iter().filter(|p| p.holds_seat()).count()
    }

    /// Denominator for consensus: seated participants allowed to vote.
    pub fn voting_member_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.is_voting_member())
            .count()
    }

    /// Seat a participant, or update the existing record for the same id.
    ///
    /// Disconnected participants keep their seat while their grace window is
    /// open, so a returning participant only competes for capacity once it
    /// has lapsed.
    pub fn join(
        &mut self,
        id: ParticipantId,
        display_name: &str,
        role: Role,
        max_seats: usize,
        policy: &HeartbeatPolicy,
        now: DateTime<Utc>,
    ) -> Result<(JoinOutcome, Option<StatusChange>), SessionError> {
        let seated = self
            .participants
            .iter()
            .filter(|p| {
                p.id != id && effective_status(p, policy, now) != ConnectionStatus::Left
            })
            .count();

        if let Some(existing) = self.participants.iter_mut().find(|p| p.id == id) {
            let from = effective_status(existing, policy, now);
            let outcome = match from {
                ConnectionStatus::Connected => JoinOutcome::AlreadyConnected,
                ConnectionStatus::Disconnected => JoinOutcome::Reconnected,
                ConnectionStatus::Left => {
                    if seated >= max_seats {
                        return Err(seat_cap_error(max_seats));
                    }
                    existing.role = role;
                    JoinOutcome::Rejoined
                }
            };
            existing.status = ConnectionStatus::Connected;
            existing.last_heartbeat_at = now;
            if !display_name.is_empty() {
                existing.display_name = display_name.to_string();
            }
            let change = (from != ConnectionStatus::Connected).then(|| StatusChange {
                participant_id: id,
                from,
                to: ConnectionStatus::Connected,
                at: now,
            });
            return Ok((outcome, change));
        }

        if seated >= max_seats {
            return Err(seat_cap_error(max_seats));
        }

        self.participants
            .push(Participant::new(id, display_name, role, now));
        Ok((JoinOutcome::Joined, None))
    }

    /// Record a heartbeat. A heartbeat from a disconnected client restores it.
    ///
    /// A participant whose grace window has lapsed is rejected even if no
    /// sweep has recorded the departure yet.
    pub fn heartbeat(
        &mut self,
        id: &ParticipantId,
        policy: &HeartbeatPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, SessionError> {
        let participant = self.get_mut(id)?;
        match effective_status(participant, policy, now) {
            ConnectionStatus::Left => Err(SessionError::NotActive(id.to_string())),
            ConnectionStatus::Connected => {
                participant.last_heartbeat_at = now;
                Ok(None)
            }
            ConnectionStatus::Disconnected => {
                participant.status = ConnectionStatus::Connected;
                participant.last_heartbeat_at = now;
                Ok(Some(StatusChange {
                    participant_id: id.clone(),
                    from: ConnectionStatus::Disconnected,
                    to: ConnectionStatus::Connected,
                    at: now,
                }))
            }
        }
    }

    /// Restore a participant whose grace window has not expired.
    pub fn reconnect(
        &mut self,
        id: &ParticipantId,
        policy: &HeartbeatPolicy,
        now: DateTime<Utc>,
    ) -> Result<(ReconnectOutcome, Option<StatusChange>), SessionError> {
        let participant = self.get_mut(id)?;
        match effective_status(participant, policy, now) {
            ConnectionStatus::Left => Err(SessionError::NotActive(id.to_string())),
            ConnectionStatus::Connected => {
                participant.last_heartbeat_at = now;
                Ok((ReconnectOutcome::AlreadyConnected, None))
            }
            ConnectionStatus::Disconnected => {
                participant.status = ConnectionStatus::Connected;
                participant.last_heartbeat_at = now;
                Ok((
                    ReconnectOutcome::Restored,
                    Some(StatusChange {
                        participant_id: id.clone(),
                        from: ConnectionStatus::Disconnected,
                        to: ConnectionStatus::Connected,
                        at: now,
                    }),
                ))
            }
        }
    }

    /// Explicit exit. Leaving twice is a no-op.
    pub fn leave(
        &mut self,
        id: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, SessionError> {
        let participant = self.get_mut(id)?;
        if participant.status == ConnectionStatus::Left {
            return Ok(None);
        }
        let from = participant.status;
        participant.status = ConnectionStatus::Left;
        Ok(Some(StatusChange {
            participant_id: id.clone(),
            from,
            to: ConnectionStatus::Left,
            at: now,
        }))
    }

    /// Check that a participant may mutate the session.
    ///
    /// Activity from a disconnected participant counts as a reconnection.
    pub fn authorize_contribution(
        &mut self,
        id: &ParticipantId,
        policy: &HeartbeatPolicy,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, SessionError> {
        let participant = self.get_mut(id)?;
        if !participant.role.can_contribute() {
            return Err(SessionError::InvalidInput(format!(
                "participant {id} is an observer and cannot contribute"
            )));
        }
        self.heartbeat(id, policy, now)
    }

    /// Apply heartbeat timeouts.
    ///
    /// Deadlines are derived from the last heartbeat, so the result does not
    /// depend on how often the sweep runs. Operations between sweeps apply the
    /// same grace deadline through `effective_status`.
    pub fn sweep(&mut self, policy: &HeartbeatPolicy, now: DateTime<Utc>) -> Vec<StatusChange> {
        let mut changes = Vec::new();
        for participant in &mut self.participants {
            let silence = now - participant.last_heartbeat_at;
            let next = match participant.status {
                ConnectionStatus::Connected if silence >= policy.leave_after() => {
                    Some(ConnectionStatus::Left)
                }
                ConnectionStatus::Connected if silence >= policy.disconnect_after() => {
                    Some(ConnectionStatus::Disconnected)
                }
                ConnectionStatus::Disconnected if silence >= policy.leave_after() => {
                    Some(ConnectionStatus::Left)
                }
                _ => None,
            };
            if let Some(to) = next {
                changes.push(StatusChange {
                    participant_id: participant.id.clone(),
                    from: participant.status,
                    to,
                    at: now,
                });
                participant.status = to;
            }
        }
        changes
    }
}

/// Stored status, with a lapsed grace window read as `Left`.
fn effective_status(
    participant: &Participant,
    policy: &HeartbeatPolicy,
    now: DateTime<Utc>,
) -> ConnectionStatus {
    if participant.status != ConnectionStatus::Left
        && policy.has_lapsed(participant.last_heartbeat_at, now)
    {
        ConnectionStatus::Left
    } else {
        participant.status
    }
}

fn seat_cap_error(limit: usize) -> SessionError {
    SessionError::CapacityExceeded {
        resource: "participant",
        limit,
        remediation: "wait for a seat to free up or start a separate session",
    }
}
