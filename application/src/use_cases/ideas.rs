//! Idea log use cases: contribute, revise and read back.

use super::registry::SessionRegistry;
use crate::ports::clock::Clock;
use huddle_domain::{Idea, IdeaAccepted, IdeaId, ParticipantId, SessionError, SessionId};
use std::sync::Arc;
use tracing::debug;

pub struct IdeaService {
    registry: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl IdeaService {
    pub fn new(registry: Arc<SessionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Append an idea. Every call appends, even with identical text.
    pub async fn contribute(
        &self,
        session: &SessionId,
        contributor: &ParticipantId,
        text: &str,
    ) -> Result<IdeaAccepted, SessionError> {
        self.append(session, contributor, text, None).await
    }

    /// Append a new idea that supersedes `original`. The original stays.
    pub async fn revise(
        &self,
        session: &SessionId,
        contributor: &ParticipantId,
        original: &IdeaId,
        text: &str,
    ) -> Result<IdeaAccepted, SessionError> {
        self.append(session, contributor, text, Some(original.clone()))
            .await
    }

    async fn append(
        &self,
        session: &SessionId,
        contributor: &ParticipantId,
        text: &str,
        revises: Option<IdeaId>,
    ) -> Result<IdeaAccepted, SessionError> {
        let handle = self.registry.get(session).await?;
        let now = self.clock.now();
        let accepted = handle
            .mutate("contribute_idea", |s| {
                s.contribute_idea(contributor, text, revises, now)
            })
            .await?;
        debug!(
            session_id = %session,
            participant_id = %contributor,
            sequence = accepted.idea.sequence,
            "Idea appended"
        );
        Ok(accepted)
    }

    /// The `n` most recent ideas, oldest first.
    pub async fn tail(&self, session: &SessionId, n: usize) -> Result<Vec<Idea>, SessionError> {
        let handle = self.registry.get(session).await?;
        let state = handle.read().await;
        Ok(state.tail(n).to_vec())
    }

    /// Ideas with a sequence number above `sequence`.
    pub async fn since(
        &self,
        session: &SessionId,
        sequence: u64,
    ) -> Result<Vec<Idea>, SessionError> {
        let handle = self.registry.get(session).await?;
        let state = handle.read().await;
        Ok(state.ideas_since(sequence).to_vec())
    }
}
