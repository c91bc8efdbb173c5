//! Per-session handle
//!
//! A [`SessionHandle`] is the single logical mutation point of one session:
//! a read/write lock around the [`Session`] aggregate plus the broadcast
//! channel its events fan out on. Events are sent while the write lock is
//! still held, so every subscriber sees them in mutation order.
//!
//! The lifecycle status is mirrored into a watch channel after every
//! mutation so it can be read without touching the session lock.

use crate::ports::session_journal::{JournalRecord, SessionJournal};
use huddle_domain::{
    Applied, Session, SessionError, SessionEvent, SessionId, SessionStatus, WorkspaceId,
};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct SessionHandle {
    id: SessionId,
    workspace_id: WorkspaceId,
    state: RwLock<Session>,
    events: broadcast::Sender<SessionEvent>,
    status: watch::Sender<SessionStatus>,
    journal: Arc<dyn SessionJournal>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub fn new(session: Session, capacity: usize, journal: Arc<dyn SessionJournal>) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        let (status, _) = watch::channel(session.status());
        Self {
            id: session.id().clone(),
            workspace_id: session.workspace_id().clone(),
            state: RwLock::new(session),
            events,
            status,
            journal,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    /// Lifecycle status as of the last completed mutation. Never waits on
    /// the session lock.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Shared read access. Reads run concurrently with each other and see
    /// the state left by the last completed mutation.
    pub async fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().await
    }

    /// Run `f` inside the session's exclusive section and broadcast the
    /// events it produced.
    pub async fn mutate<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Session) -> Result<Applied<T>, SessionError>,
    ) -> Result<T, SessionError> {
        let mut session = self.state.write().await;
        match f(&mut *session) {
            Ok(applied) => {
                self.mirror_status(&session);
                for event in applied.events {
                    self.emit(event);
                }
                Ok(applied.value)
            }
            Err(e) => {
                self.log_rejection(op, &e);
                Err(e)
            }
        }
    }

    /// Like [`mutate`](Self::mutate) for operations that yield events only.
    pub async fn mutate_events(&self, f: impl FnOnce(&mut Session) -> Vec<SessionEvent>) {
        let mut session = self.state.write().await;
        let events = f(&mut *session);
        self.mirror_status(&session);
        for event in events {
            self.emit(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Write a journal record that is not a broadcast event.
    pub fn journal(&self, record_type: &'static str, payload: serde_json::Value) {
        self.journal
            .record(JournalRecord::new(record_type, self.id.clone(), payload));
    }

    /// Token cancelled when the session is evicted.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn mirror_status(&self, session: &Session) {
        let current = session.status();
        self.status.send_if_modified(|status| {
            let changed = *status != current;
            *status = current;
            changed
        });
    }

    fn emit(&self, event: SessionEvent) {
        self.journal.record(JournalRecord::from_event(&self.id, &event));
        // No subscribers is fine; the event is still journaled.
        let _ = self.events.send(event);
    }

    fn log_rejection(&self, op: &str, error: &SessionError) {
        match error {
            SessionError::InvalidTransition { .. } => {
                warn!(session_id = %self.id, op, "Rejected: {}", error);
            }
            _ => {
                debug!(session_id = %self.id, op, "Rejected: {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::session_journal::NoSessionJournal;
    use chrono::Utc;
    use huddle_domain::{ParticipantId, Role, SessionRules, SessionStatus};
    use std::sync::Mutex;

    struct RecordingJournal {
        types: Mutex<Vec<&'static str>>,
    }

    impl SessionJournal for RecordingJournal {
        fn record(&self, record: JournalRecord) {
            self.types.lock().unwrap().push(record.record_type);
        }
    }

    fn handle(journal: Arc<dyn SessionJournal>) -> SessionHandle {
        let session = Session::new(
            SessionId::new("s"),
            WorkspaceId::new("w"),
            "t",
            SessionRules::default(),
            Utc::now(),
        );
        SessionHandle::new(session, 16, journal)
    }

    #[tokio::test]
    async fn test_mutation_broadcasts_and_journals() {
        let journal = Arc::new(RecordingJournal {
            types: Mutex::new(Vec::new()),
        });
        let handle = handle(journal.clone());
        let mut rx = handle.subscribe();

        handle
            .mutate("join", |s| {
                s.join(ParticipantId::new("a"), "a", Role::Initiator, Utc::now())
            })
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), "participant_joined");
        assert_eq!(*journal.types.lock().unwrap(), vec!["participant_joined"]);
    }

    #[tokio::test]
    async fn test_rejected_mutation_emits_nothing() {
        let handle = handle(Arc::new(NoSessionJournal));
        let mut rx = handle.subscribe();

        let err = handle
            .mutate("transition", |s| s.transition(SessionStatus::Ended, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_status_readable_while_session_locked() {
        let handle = handle(Arc::new(NoSessionJournal));
        let mut watcher = handle.watch_status();
        handle
            .mutate("transition", |s| s.transition(SessionStatus::Active, Utc::now()))
            .await
            .unwrap();
        assert!(watcher.has_changed().unwrap());

        let guard = handle.read().await;
        assert_eq!(handle.status(), SessionStatus::Active);
        drop(guard);

        handle
            .mutate("transition", |s| s.transition(SessionStatus::Ending, Utc::now()))
            .await
            .unwrap();
        assert_eq!(*watcher.borrow_and_update(), SessionStatus::Ending);
    }
}
