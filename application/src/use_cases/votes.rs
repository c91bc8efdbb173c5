//! Vote aggregation use cases

use super::registry::SessionRegistry;
use crate::ports::clock::Clock;
use huddle_domain::{IdeaId, ParticipantId, RankedIdea, SessionError, SessionId, VoteTally};
use std::sync::Arc;
use tracing::debug;

pub struct VoteService {
    registry: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl VoteService {
    pub fn new(registry: Arc<SessionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Cast a vote. Repeats never count twice.
    pub async fn vote(
        &self,
        session: &SessionId,
        voter: &ParticipantId,
        idea: &IdeaId,
    ) -> Result<VoteTally, SessionError> {
        let handle = self.registry.get(session).await?;
        let now = self.clock.now();
        let tally = handle.mutate("vote", |s| s.vote(idea, voter, now)).await?;
        debug!(session_id = %session, participant_id = %voter, idea_id = %idea, votes = tally.votes, "Vote");
        Ok(tally)
    }

    /// Retract a vote. Retracting twice is a no-op.
    pub async fn unvote(
        &self,
        session: &SessionId,
        voter: &ParticipantId,
        idea: &IdeaId,
    ) -> Result<VoteTally, SessionError> {
        let handle = self.registry.get(session).await?;
        let now = self.clock.now();
        handle.mutate("unvote", |s| s.unvote(idea, voter, now)).await
    }

    pub async fn consensus_score(&self, session: &SessionId) -> Result<f64, SessionError> {
        let handle = self.registry.get(session).await?;
        let state = handle.read().await;
        Ok(state.consensus_score())
    }

    /// Top `k` ideas by votes, ties broken by earliest sequence.
    pub async fn top_rated(
        &self,
        session: &SessionId,
        k: usize,
    ) -> Result<Vec<RankedIdea>, SessionError> {
        let handle = self.registry.get(session).await?;
        let state = handle.read().await;
        Ok(state.top_rated(k))
    }
}
