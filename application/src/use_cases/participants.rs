//! Participant use cases: join, heartbeat, reconnect, leave and the sweep.

use super::handle::SessionHandle;
use super::registry::SessionRegistry;
use crate::config::EngineConfig;
use crate::ports::clock::Clock;
use huddle_domain::{
    JoinOutcome, ParticipantId, ReconnectOutcome, Role, SessionError, SessionId,
    SessionSnapshot,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for joining a session
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub role: Role,
}

impl JoinRequest {
    pub fn new(participant_id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            display_name: display_name.into(),
            role: Role::Contributor,
        }
    }

    pub fn as_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Result of an accepted join
#[derive(Debug, Clone)]
pub struct Joined {
    pub outcome: JoinOutcome,
    pub snapshot: SessionSnapshot,
}

pub struct ParticipantService {
    registry: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
}

impl ParticipantService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        clock: Arc<dyn Clock>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            registry,
            clock,
            config,
        }
    }

    /// Seat a participant.
    ///
    /// Rejected with `CapacityExceeded` above the seat cap and with
    /// `SessionEnded` once the session is winding down.
    pub async fn join(&self, session: &SessionId, request: JoinRequest) -> Result<Joined, SessionError> {
        let handle = self.registry.get(session).await?;
        self.join_handle(&handle, request).await
    }

    pub(crate) async fn join_handle(
        &self,
        handle: &SessionHandle,
        request: JoinRequest,
    ) -> Result<Joined, SessionError> {
        let now = self.clock.now();
        let participant = request.participant_id.clone();
        let outcome = handle
            .mutate("join", |s| {
                s.join(
                    request.participant_id,
                    &request.display_name,
                    request.role,
                    now,
                )
            })
            .await?;
        info!(
            session_id = %handle.id(),
            participant_id = %participant,
            ?outcome,
            "Participant joined"
        );
        Ok(Joined {
            outcome,
            snapshot: self.snapshot_of(handle).await,
        })
    }

    pub async fn heartbeat(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<(), SessionError> {
        let handle = self.registry.get(session).await?;
        let now = self.clock.now();
        handle
            .mutate("heartbeat", |s| s.heartbeat(participant, now))
            .await
    }

    /// Restore a participant inside the grace window and hand back a
    /// snapshot for catch-up.
    pub async fn reconnect(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<(ReconnectOutcome, SessionSnapshot), SessionError> {
        let handle = self.registry.get(session).await?;
        let now = self.clock.now();
        let outcome = handle
            .mutate("reconnect", |s| s.reconnect(participant, now))
            .await?;
        debug!(session_id = %session, participant_id = %participant, ?outcome, "Reconnect");
        Ok((outcome, self.snapshot_of(&handle).await))
    }

    pub async fn leave(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<bool, SessionError> {
        let handle = self.registry.get(session).await?;
        let now = self.clock.now();
        let left = handle
            .mutate("leave", |s| s.leave(participant, now))
            .await?;
        if left {
            info!(session_id = %session, participant_id = %participant, "Participant left");
        }
        Ok(left)
    }

    /// Apply heartbeat timeouts to one session. Returns how many
    /// participants changed state.
    pub async fn sweep(&self, handle: &SessionHandle) -> usize {
        let now = self.clock.now();
        let mut changed = 0;
        handle
            .mutate_events(|s| {
                let events = s.sweep_participants(now);
                changed = events.len();
                events
            })
            .await;
        if changed > 0 {
            debug!(session_id = %handle.id(), changed, "Heartbeat sweep");
        }
        changed
    }

    pub async fn snapshot(&self, session: &SessionId) -> Result<SessionSnapshot, SessionError> {
        let handle = self.registry.get(session).await?;
        Ok(self.snapshot_of(&handle).await)
    }

    async fn snapshot_of(&self, handle: &SessionHandle) -> SessionSnapshot {
        handle.read().await.snapshot(
            self.config.snapshot_idea_tail,
            self.config.snapshot_assistant_tail,
        )
    }
}
