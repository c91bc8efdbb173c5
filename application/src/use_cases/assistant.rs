//! Assistant scheduler use case
//!
//! Drives one assistant invocation end to end:
//!
//! ```text
//! trigger ──▶ reserve + snapshot window (lock held)
//!         ──▶ suggest(window)            (lock released)
//!               ├─ within SLA ──────────▶ publish
//!               └─ SLA missed ─▶ "composing" placeholder
//!                                 ├─ before deadline ─▶ publish (or discard if closed)
//!                                 └─ deadline passed ─▶ drop
//! ```
//!
//! The capability is never called while the session lock is held, and an
//! in-flight call is never cancelled when the session ends; its result is
//! discarded instead.

use super::handle::SessionHandle;
use super::safety::SafetyMonitor;
use crate::config::{EngineConfig, delta};
use crate::ports::capability::CapabilityError;
use crate::ports::clock::Clock;
use crate::ports::suggestion::SuggestionProvider;
use huddle_domain::{
    Applied, ContextWindow, ContributionId, DropReason, ParticipantId, PendingAssistant,
    SafetyTarget, SessionError, Suggestion, TriggerReason,
};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How an invocation ended
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Published {
        contribution_id: ContributionId,
        /// The SLA was missed and a placeholder went out first
        late: bool,
    },
    /// The session stopped accepting contributions before the result arrived
    Discarded,
    Dropped(DropReason),
}

/// A started invocation
#[derive(Debug)]
pub struct Invocation {
    pub ticket: u64,
    pub task: JoinHandle<InvocationOutcome>,
}

#[derive(Clone)]
pub struct AssistantScheduler {
    provider: Arc<dyn SuggestionProvider>,
    safety: SafetyMonitor,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
}

impl AssistantScheduler {
    pub fn new(
        provider: Arc<dyn SuggestionProvider>,
        safety: SafetyMonitor,
        clock: Arc<dyn Clock>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            provider,
            safety,
            clock,
            config,
        }
    }

    /// Explicit request from a participant.
    ///
    /// Returns `None` when an invocation is already in flight; the request is
    /// answered by that invocation.
    pub async fn request(
        &self,
        handle: Arc<SessionHandle>,
        by: &ParticipantId,
    ) -> Result<Option<Invocation>, SessionError> {
        let now = self.clock.now();
        handle
            .mutate("request_assistant", |s| {
                s.authorize_assistant_request(by, now)
                    .map(|events| Applied { value: (), events })
            })
            .await?;
        self.trigger(handle, TriggerReason::Requested { by: by.clone() })
            .await
    }

    /// Start an invocation for `reason` unless one is already in flight.
    pub async fn trigger(
        &self,
        handle: Arc<SessionHandle>,
        reason: TriggerReason,
    ) -> Result<Option<Invocation>, SessionError> {
        let now = self.clock.now();
        let deadline = now + delta(self.config.assistant_request_deadline);
        let reserved = handle
            .mutate("begin_assistant", |s| {
                let pending = s.begin_assistant(reason.clone(), deadline, now)?;
                let events = match pending {
                    Some(_) => Vec::new(),
                    None => s.coalesced_notice(reason, now).into_iter().collect(),
                };
                let window = pending.as_ref().map(|_| s.context_window(now));
                Ok(Applied {
                    value: pending.zip(window),
                    events,
                })
            })
            .await?;

        let Some((pending, window)) = reserved else {
            debug!(session_id = %handle.id(), "Assistant already in flight; trigger coalesced");
            return Ok(None);
        };

        info!(
            session_id = %handle.id(),
            ticket = pending.ticket,
            trigger = %pending.trigger,
            window = window.entries.len(),
            "Invoking assistant"
        );
        handle.journal(
            "assistant_invoked",
            json!({
                "ticket": pending.ticket,
                "trigger": pending.trigger,
                "context": window,
            }),
        );

        let ticket = pending.ticket;
        let this = self.clone();
        let task = tokio::spawn(async move { this.run(handle, pending, window).await });
        Ok(Some(Invocation { ticket, task }))
    }

    async fn run(
        &self,
        handle: Arc<SessionHandle>,
        pending: PendingAssistant,
        window: ContextWindow,
    ) -> InvocationOutcome {
        let ticket = pending.ticket;
        let sla = self.config.assistant_sla;
        let budget = self.config.assistant_request_deadline;

        let (result, late) = {
            let call = self.provider.suggest(&window);
            tokio::pin!(call);
            match timeout(sla, &mut call).await {
                Ok(result) => (result, false),
                Err(_) => {
                    info!(
                        session_id = %handle.id(),
                        ticket,
                        sla_ms = sla.as_millis() as u64,
                        "Assistant missed SLA; sending placeholder"
                    );
                    let now = self.clock.now();
                    handle
                        .mutate_events(|s| s.composing_notice(ticket, now).into_iter().collect())
                        .await;
                    let remaining = budget.saturating_sub(sla);
                    match timeout(remaining, &mut call).await {
                        Ok(result) => (result, true),
                        Err(_) => (Err(CapabilityError::Timeout), true),
                    }
                }
            }
        };

        let suggestion = match result.map_err(SessionError::from) {
            Ok(suggestion) => suggestion,
            Err(SessionError::ExternalTimeout) => {
                info!(session_id = %handle.id(), ticket, "Assistant request deadline passed");
                return self
                    .drop_ticket(&handle, ticket, DropReason::from(&SessionError::ExternalTimeout))
                    .await;
            }
            Err(e) => {
                warn!(session_id = %handle.id(), ticket, provider = self.provider.name(), "Suggestion failed: {}", e);
                return self.drop_ticket(&handle, ticket, DropReason::from(&e)).await;
            }
        };
        self.publish(handle, ticket, suggestion, window, late).await
    }

    async fn publish(
        &self,
        handle: Arc<SessionHandle>,
        ticket: u64,
        suggestion: Suggestion,
        window: ContextWindow,
        late: bool,
    ) -> InvocationOutcome {
        let now = self.clock.now();
        let published = handle
            .mutate("publish_suggestion", |s| {
                s.publish_suggestion(ticket, suggestion, window, now)
            })
            .await;

        match published {
            Ok(contribution) => {
                info!(
                    session_id = %handle.id(),
                    ticket,
                    references = contribution.referenced_ideas.len(),
                    late,
                    "Assistant contribution published"
                );
                let contribution_id = contribution.id.clone();
                self.safety.scan_in_background(
                    handle,
                    SafetyTarget::Contribution(contribution.id),
                    contribution.text,
                );
                InvocationOutcome::Published {
                    contribution_id,
                    late,
                }
            }
            Err(e) if e.is_stale() => {
                debug!(session_id = %handle.id(), ticket, "Assistant result discarded");
                let reason = DropReason::from(&e);
                handle
                    .mutate_events(|s| s.abandon_assistant(ticket, reason).into_iter().collect())
                    .await;
                InvocationOutcome::Discarded
            }
            Err(e) => {
                warn!(session_id = %handle.id(), ticket, "Suggestion rejected: {}", e);
                self.drop_ticket(&handle, ticket, DropReason::from(&e)).await
            }
        }
    }

    async fn drop_ticket(
        &self,
        handle: &SessionHandle,
        ticket: u64,
        reason: DropReason,
    ) -> InvocationOutcome {
        let dropped = reason.clone();
        handle
            .mutate_events(|s| s.abandon_assistant(ticket, dropped).into_iter().collect())
            .await;
        InvocationOutcome::Dropped(reason)
    }

    /// Record a participant's reaction to a published contribution.
    pub async fn annotate_feedback(
        &self,
        handle: &SessionHandle,
        contribution: &ContributionId,
        participant: &ParticipantId,
        helpful: bool,
        note: Option<String>,
    ) -> Result<(), SessionError> {
        let now = self.clock.now();
        handle
            .mutate("annotate_feedback", |s| {
                s.annotate_feedback(contribution, participant, helpful, note, now)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::SystemClock;
    use crate::ports::safety_scanner::NoSafetyScan;
    use crate::ports::session_journal::NoSessionJournal;
    use async_trait::async_trait;
    use huddle_domain::{
        Role, Session, SessionEvent, SessionId, SessionRules, SessionStatus, WorkspaceId,
    };
    use std::time::Duration;

    // ==================== Test Mocks ====================

    struct MockSuggester {
        delay: Duration,
        fail: bool,
    }

    impl MockSuggester {
        fn after(delay: Duration) -> Self {
            Self { delay, fail: false }
        }

        fn failing() -> Self {
            Self {
                delay: Duration::from_millis(10),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SuggestionProvider for MockSuggester {
        async fn suggest(&self, window: &ContextWindow) -> Result<Suggestion, CapabilityError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(CapabilityError::Unavailable("offline".to_string()));
            }
            let cited = window.idea_ids_newest_first().into_iter().take(1).collect();
            Ok(Suggestion::new("merge the first two", cited, 0.8))
        }
    }

    fn scheduler(provider: MockSuggester) -> AssistantScheduler {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        AssistantScheduler::new(
            Arc::new(provider),
            SafetyMonitor::new(Arc::new(NoSafetyScan), clock.clone()),
            clock,
            Arc::new(EngineConfig::default()),
        )
    }

    async fn session_with_ideas(n: usize) -> Arc<SessionHandle> {
        let now = chrono::Utc::now();
        let session = Session::new(
            SessionId::new("s"),
            WorkspaceId::new("w"),
            "t",
            SessionRules::default(),
            now,
        );
        let handle = Arc::new(SessionHandle::new(session, 64, Arc::new(NoSessionJournal)));
        let p = ParticipantId::new("ana");
        handle
            .mutate("join", |s| s.join(p.clone(), "ana", Role::Initiator, now))
            .await
            .unwrap();
        for i in 0..n {
            handle
                .mutate("idea", |s| s.contribute_idea(&p, &format!("idea {i}"), None, now))
                .await
                .unwrap();
        }
        handle
    }

    fn requested() -> TriggerReason {
        TriggerReason::Requested {
            by: ParticipantId::new("ana"),
        }
    }

    fn assistant_events(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if event.kind().starts_with("assistant_") {
                kinds.push(event.kind());
            }
        }
        kinds
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_response_published_without_placeholder() {
        let handle = session_with_ideas(4).await;
        let mut rx = handle.subscribe();
        let invocation = scheduler(MockSuggester::after(Duration::from_millis(500)))
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();

        let outcome = invocation.task.await.unwrap();
        assert!(matches!(outcome, InvocationOutcome::Published { late: false, .. }));
        assert_eq!(assistant_events(&mut rx), vec!["assistant_contributed"]);

        let session = handle.read().await;
        let contribution = &session.contributions()[0];
        assert_eq!(contribution.referenced_ideas.len(), 3);
        assert!(session.pending_assistant().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sla_miss_sends_placeholder_then_result() {
        let handle = session_with_ideas(3).await;
        let mut rx = handle.subscribe();
        let invocation = scheduler(MockSuggester::after(Duration::from_secs(5)))
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();

        let outcome = invocation.task.await.unwrap();
        assert!(matches!(outcome, InvocationOutcome::Published { late: true, .. }));
        assert_eq!(
            assistant_events(&mut rx),
            vec!["assistant_composing", "assistant_contributed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_drops_invocation() {
        let handle = session_with_ideas(3).await;
        let mut rx = handle.subscribe();
        let invocation = scheduler(MockSuggester::after(Duration::from_secs(120)))
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();

        let outcome = invocation.task.await.unwrap();
        assert_eq!(outcome, InvocationOutcome::Dropped(DropReason::DeadlineExceeded));
        assert_eq!(
            assistant_events(&mut rx),
            vec!["assistant_composing", "assistant_dropped"]
        );
        assert!(handle.read().await.contributions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_discarded_after_session_winds_down() {
        let handle = session_with_ideas(3).await;
        let mut rx = handle.subscribe();
        let invocation = scheduler(MockSuggester::after(Duration::from_secs(5)))
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        let now = chrono::Utc::now();
        handle
            .mutate("end", |s| s.transition(SessionStatus::Ending, now))
            .await
            .unwrap();

        let outcome = invocation.task.await.unwrap();
        assert_eq!(outcome, InvocationOutcome::Discarded);
        let session = handle.read().await;
        assert!(session.contributions().is_empty());
        assert!(session.pending_assistant().is_none());
        drop(session);

        let mut dropped = None;
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::AssistantDropped { reason, .. } = event {
                dropped = Some(reason);
            }
        }
        assert_eq!(dropped, Some(DropReason::SessionClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_coalesced_while_in_flight() {
        let handle = session_with_ideas(3).await;
        let scheduler = scheduler(MockSuggester::after(Duration::from_secs(1)));
        let first = scheduler
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();
        let second = scheduler.trigger(handle.clone(), requested()).await.unwrap();
        assert!(second.is_none());

        first.task.await.unwrap();
        let third = scheduler.trigger(handle.clone(), requested()).await.unwrap();
        assert!(third.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_coalesced_request_is_acknowledged_immediately() {
        let handle = session_with_ideas(3).await;
        let scheduler = scheduler(MockSuggester::after(Duration::from_secs(8)));
        let first = scheduler
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        let mut rx = handle.subscribe();
        let second = scheduler.trigger(handle.clone(), requested()).await.unwrap();
        assert!(second.is_none());

        let event = rx.try_recv().unwrap();
        assert!(event.answers_ticket(first.ticket));
        assert_eq!(event.kind(), "assistant_composing");

        let outcome = first.task.await.unwrap();
        assert!(matches!(outcome, InvocationOutcome::Published { late: true, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_automatic_trigger_coalesces_silently() {
        let handle = session_with_ideas(3).await;
        let scheduler = scheduler(MockSuggester::after(Duration::from_secs(1)));
        let first = scheduler
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();
        let mut rx = handle.subscribe();
        let second = scheduler
            .trigger(handle.clone(), TriggerReason::Automatic { ideas_since_last: 5 })
            .await
            .unwrap();
        assert!(second.is_none());
        assert!(assistant_events(&mut rx).is_empty());
        first.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_capability_failure_is_not_fatal() {
        let handle = session_with_ideas(2).await;
        let mut rx = handle.subscribe();
        let invocation = scheduler(MockSuggester::failing())
            .trigger(handle.clone(), requested())
            .await
            .unwrap()
            .unwrap();

        let outcome = invocation.task.await.unwrap();
        assert!(matches!(
            outcome,
            InvocationOutcome::Dropped(DropReason::CapabilityFailed(_))
        ));
        assert_eq!(assistant_events(&mut rx), vec!["assistant_dropped"]);
        assert_eq!(handle.read().await.status(), SessionStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_cannot_request() {
        let handle = session_with_ideas(1).await;
        let now = chrono::Utc::now();
        let observer = ParticipantId::new("obs");
        handle
            .mutate("join", |s| s.join(observer.clone(), "obs", Role::Observer, now))
            .await
            .unwrap();

        let err = scheduler(MockSuggester::after(Duration::ZERO))
            .request(handle, &observer)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)));
    }
}
