//! Session registry use case
//!
//! Owns the map from session id to [`SessionHandle`]. The registry lock only
//! guards membership of that map; session state is always mutated through
//! the session's own handle.

use super::handle::SessionHandle;
use crate::config::{EngineConfig, delta};
use crate::ports::clock::Clock;
use crate::ports::session_journal::SessionJournal;
use huddle_domain::{
    EntityKind, Session, SessionError, SessionId, SessionStatus, WorkspaceId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub workspace_id: WorkspaceId,
    pub title: String,
    /// Use this id instead of generating one
    pub session_id: Option<SessionId>,
}

impl CreateSession {
    pub fn new(workspace_id: impl Into<WorkspaceId>, title: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            title: title.into(),
            session_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    journal: Arc<dyn SessionJournal>,
}

impl SessionRegistry {
    pub fn new(
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        journal: Arc<dyn SessionJournal>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            clock,
            journal,
        }
    }

    /// Create a session in `forming`.
    ///
    /// Fails with `CapacityExceeded` when the workspace already runs the
    /// maximum number of sessions that have not ended.
    pub async fn create(&self, request: CreateSession) -> Result<Arc<SessionHandle>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let id = request.session_id.unwrap_or_else(SessionId::generate);
        if sessions.contains_key(&id) {
            return Err(SessionError::InvalidInput(format!(
                "session {id} already exists"
            )));
        }
        self.ensure_workspace_capacity(&sessions, &request.workspace_id)?;

        let session = Session::new(
            id.clone(),
            request.workspace_id.clone(),
            request.title,
            self.config.session_rules(),
            self.clock.now(),
        );
        let handle = Arc::new(SessionHandle::new(
            session,
            self.config.broadcast_capacity,
            self.journal.clone(),
        ));
        sessions.insert(id.clone(), handle.clone());
        info!(
            session_id = %id,
            workspace_id = %request.workspace_id,
            "Session created"
        );
        Ok(handle)
    }

    /// Return the session, creating it when it does not exist yet.
    ///
    /// The boolean is true when this call created it.
    pub async fn get_or_create(
        &self,
        id: &SessionId,
        request: CreateSession,
    ) -> Result<(Arc<SessionHandle>, bool), SessionError> {
        if let Ok(handle) = self.get(id).await {
            return Ok((handle, false));
        }
        match self.create(request.with_id(id.clone())).await {
            Ok(handle) => Ok((handle, true)),
            // Lost a race with another creator.
            Err(SessionError::InvalidInput(_)) => Ok((self.get(id).await?, false)),
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, id: &SessionId) -> Result<Arc<SessionHandle>, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::not_found(EntityKind::Session, id))
    }

    /// Move a session forward in its lifecycle. Same-status moves are no-ops.
    pub async fn transition(
        &self,
        id: &SessionId,
        target: SessionStatus,
    ) -> Result<bool, SessionError> {
        let handle = self.get(id).await?;
        let now = self.clock.now();
        handle
            .mutate("transition", |s| s.transition(target, now))
            .await
    }

    /// Drop a session from memory and stop its background tasks.
    pub async fn evict(&self, id: &SessionId) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| SessionError::not_found(EntityKind::Session, id))?;
        handle.close();
        info!(session_id = %id, "Session evicted");
        Ok(())
    }

    /// Evict ended sessions past retention and forming sessions that sat idle
    /// and empty beyond the TTL. Returns the evicted ids.
    pub async fn reap(&self) -> Vec<SessionId> {
        let now = self.clock.now();
        let retention = delta(self.config.ended_retention);
        let idle_ttl = delta(self.config.forming_idle_ttl);

        let mut expired = Vec::new();
        for handle in self.handles().await {
            if handle.read().await.is_evictable(retention, idle_ttl, now) {
                expired.push(handle.id().clone());
            }
        }
        if expired.is_empty() {
            return expired;
        }

        let mut sessions = self.sessions.write().await;
        expired.retain(|id| match sessions.remove(id) {
            Some(handle) => {
                handle.close();
                true
            }
            None => false,
        });
        drop(sessions);
        for id in &expired {
            debug!(session_id = %id, "Session reaped");
        }
        expired
    }

    pub async fn handles(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn list(&self, workspace: &WorkspaceId) -> Vec<SessionId> {
        let mut ids: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|h| h.workspace_id() == workspace)
            .map(|h| h.id().clone())
            .collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Runs under the registry write lock, so it reads the status mirror
    /// rather than any session lock.
    fn ensure_workspace_capacity(
        &self,
        sessions: &HashMap<SessionId, Arc<SessionHandle>>,
        workspace: &WorkspaceId,
    ) -> Result<(), SessionError> {
        let running = sessions
            .values()
            .filter(|h| h.workspace_id() == workspace && !h.status().is_terminal())
            .count();
        if running >= self.config.max_sessions_per_workspace {
            return Err(SessionError::CapacityExceeded {
                resource: "session",
                limit: self.config.max_sessions_per_workspace,
                remediation: "end a running session in this workspace before starting another",
            });
        }
        Ok(())
    }
}
