//! Collaborative session engine facade
//!
//! [`CollabEngine`] wires the registry, the per-concern services and the
//! background tasks together and exposes every client operation in one
//! place. It is cheap to clone; clones share all state.

use super::assistant::{AssistantScheduler, Invocation};
use super::handle::SessionHandle;
use super::ideas::IdeaService;
use super::maintenance::{spawn_reaper, spawn_session_sweeper};
use super::participants::{JoinRequest, Joined, ParticipantService};
use super::registry::{CreateSession, SessionRegistry};
use super::safety::SafetyMonitor;
use super::summarize::SessionSummarizer;
use super::votes::VoteService;
use crate::config::EngineConfig;
use crate::ports::action_items::{ActionItemExtractor, NoActionItems};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::safety_scanner::{NoSafetyScan, SafetyScanner};
use crate::ports::session_journal::{NoSessionJournal, SessionJournal};
use crate::ports::suggestion::SuggestionProvider;
use huddle_domain::{
    ContributionId, Idea, IdeaAccepted, IdeaId, ParticipantId, RankedIdea, ReconnectOutcome,
    SafetyTarget, SessionError, SessionEvent, SessionId, SessionSnapshot, SessionStatus,
    SessionSummary, VoteTally,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Builder for [`CollabEngine`]
pub struct CollabEngineBuilder {
    suggestions: Arc<dyn SuggestionProvider>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    scanner: Arc<dyn SafetyScanner>,
    extractor: Arc<dyn ActionItemExtractor>,
    journal: Arc<dyn SessionJournal>,
}

impl CollabEngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_safety_scanner(mut self, scanner: Arc<dyn SafetyScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_action_item_extractor(mut self, extractor: Arc<dyn ActionItemExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn SessionJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn build(self) -> CollabEngine {
        let config = Arc::new(self.config);
        let clock = self.clock;
        let registry = Arc::new(SessionRegistry::new(
            config.clone(),
            clock.clone(),
            self.journal,
        ));
        let safety = SafetyMonitor::new(self.scanner, clock.clone());

        CollabEngine {
            participants: Arc::new(ParticipantService::new(
                registry.clone(),
                clock.clone(),
                config.clone(),
            )),
            ideas: Arc::new(IdeaService::new(registry.clone(), clock.clone())),
            votes: Arc::new(VoteService::new(registry.clone(), clock.clone())),
            assistant: AssistantScheduler::new(
                self.suggestions,
                safety.clone(),
                clock.clone(),
                config.clone(),
            ),
            summarizer: SessionSummarizer::new(self.extractor, clock.clone(), config.clone()),
            safety,
            registry,
            clock,
            config,
            shutdown: CancellationToken::new(),
        }
    }
}

#[derive(Clone)]
pub struct CollabEngine {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    registry: Arc<SessionRegistry>,
    participants: Arc<ParticipantService>,
    ideas: Arc<IdeaService>,
    votes: Arc<VoteService>,
    assistant: AssistantScheduler,
    safety: SafetyMonitor,
    summarizer: SessionSummarizer,
    shutdown: CancellationToken,
}

impl CollabEngine {
    /// Start building an engine around a suggestion capability. Every other
    /// port defaults to a no-op.
    pub fn builder(suggestions: Arc<dyn SuggestionProvider>) -> CollabEngineBuilder {
        CollabEngineBuilder {
            suggestions,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock::new()),
            scanner: Arc::new(NoSafetyScan),
            extractor: Arc::new(NoActionItems),
            journal: Arc::new(NoSessionJournal),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    // ==================== Lifecycle ====================

    pub async fn create_session(&self, request: CreateSession) -> Result<SessionId, SessionError> {
        let handle = self.registry.create(request).await?;
        self.start_sweeper(handle.clone());
        Ok(handle.id().clone())
    }

    /// Join `session`, creating it in `workspace` when it does not exist yet.
    pub async fn join_or_create(
        &self,
        session: &SessionId,
        create: CreateSession,
        request: JoinRequest,
    ) -> Result<Joined, SessionError> {
        let (handle, created) = self.registry.get_or_create(session, create).await?;
        if created {
            self.start_sweeper(handle.clone());
        }
        self.participants.join_handle(&handle, request).await
    }

    /// Explicitly move a forming session to active.
    pub async fn start(&self, session: &SessionId) -> Result<bool, SessionError> {
        self.registry.transition(session, SessionStatus::Active).await
    }

    /// End the session and return its summary. Ending twice returns the same
    /// summary.
    pub async fn end(&self, session: &SessionId) -> Result<SessionSummary, SessionError> {
        let handle = self.registry.get(session).await?;
        self.summarizer.end(&handle).await
    }

    /// The summary of an ended session, if it has one.
    pub async fn summary(&self, session: &SessionId) -> Result<Option<SessionSummary>, SessionError> {
        let handle = self.registry.get(session).await?;
        let state = handle.read().await;
        Ok(state.summary().cloned())
    }

    pub async fn evict(&self, session: &SessionId) -> Result<(), SessionError> {
        self.registry.evict(session).await
    }

    pub async fn reap(&self) -> Vec<SessionId> {
        self.registry.reap().await
    }

    /// Run the registry reaper until [`shutdown`](Self::shutdown).
    pub fn spawn_reaper(&self) -> JoinHandle<()> {
        spawn_reaper(
            self.registry.clone(),
            self.config.reap_interval,
            self.shutdown.clone(),
        )
    }

    /// Stop the reaper and every session's background tasks.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        for handle in self.registry.handles().await {
            handle.close();
        }
    }

    fn start_sweeper(&self, handle: Arc<SessionHandle>) {
        spawn_session_sweeper(
            handle,
            self.participants.clone(),
            self.summarizer.clone(),
            self.clock.clone(),
            self.config.clone(),
        );
    }

    // ==================== Participants ====================

    pub async fn join(&self, session: &SessionId, request: JoinRequest) -> Result<Joined, SessionError> {
        self.participants.join(session, request).await
    }

    pub async fn heartbeat(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<(), SessionError> {
        self.participants.heartbeat(session, participant).await
    }

    pub async fn reconnect(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<(ReconnectOutcome, SessionSnapshot), SessionError> {
        self.participants.reconnect(session, participant).await
    }

    pub async fn leave(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<bool, SessionError> {
        self.participants.leave(session, participant).await
    }

    /// Apply heartbeat timeouts now instead of waiting for the sweeper.
    pub async fn sweep(&self, session: &SessionId) -> Result<usize, SessionError> {
        let handle = self.registry.get(session).await?;
        Ok(self.participants.sweep(&handle).await)
    }

    // ==================== Ideas ====================

    pub async fn contribute_idea(
        &self,
        session: &SessionId,
        contributor: &ParticipantId,
        text: &str,
    ) -> Result<Idea, SessionError> {
        let accepted = self.ideas.contribute(session, contributor, text).await?;
        self.after_append(session, accepted).await
    }

    /// Contribute a new idea that revises `original`.
    pub async fn revise_idea(
        &self,
        session: &SessionId,
        contributor: &ParticipantId,
        original: &IdeaId,
        text: &str,
    ) -> Result<Idea, SessionError> {
        let accepted = self
            .ideas
            .revise(session, contributor, original, text)
            .await?;
        self.after_append(session, accepted).await
    }

    async fn after_append(
        &self,
        session: &SessionId,
        accepted: IdeaAccepted,
    ) -> Result<Idea, SessionError> {
        let handle = self.registry.get(session).await?;
        self.safety.scan_in_background(
            handle.clone(),
            SafetyTarget::Idea(accepted.idea.id.clone()),
            accepted.idea.text.clone(),
        );
        if let Some(reason) = accepted.auto_trigger
            && let Err(e) = self.assistant.trigger(handle, reason).await
        {
            warn!(session_id = %session, "Automatic assistant trigger failed: {}", e);
        }
        Ok(accepted.idea)
    }

    pub async fn tail(&self, session: &SessionId, n: usize) -> Result<Vec<Idea>, SessionError> {
        self.ideas.tail(session, n).await
    }

    pub async fn ideas_since(
        &self,
        session: &SessionId,
        sequence: u64,
    ) -> Result<Vec<Idea>, SessionError> {
        self.ideas.since(session, sequence).await
    }

    // ==================== Votes ====================

    pub async fn vote(
        &self,
        session: &SessionId,
        voter: &ParticipantId,
        idea: &IdeaId,
    ) -> Result<VoteTally, SessionError> {
        self.votes.vote(session, voter, idea).await
    }

    pub async fn unvote(
        &self,
        session: &SessionId,
        voter: &ParticipantId,
        idea: &IdeaId,
    ) -> Result<VoteTally, SessionError> {
        self.votes.unvote(session, voter, idea).await
    }

    pub async fn consensus_score(&self, session: &SessionId) -> Result<f64, SessionError> {
        self.votes.consensus_score(session).await
    }

    pub async fn top_rated(
        &self,
        session: &SessionId,
        k: usize,
    ) -> Result<Vec<RankedIdea>, SessionError> {
        self.votes.top_rated(session, k).await
    }

    // ==================== Assistant ====================

    /// Ask the assistant for a suggestion. `None` means an invocation was
    /// already in flight and will answer this request.
    pub async fn request_assistant(
        &self,
        session: &SessionId,
        participant: &ParticipantId,
    ) -> Result<Option<Invocation>, SessionError> {
        let handle = self.registry.get(session).await?;
        self.assistant.request(handle, participant).await
    }

    pub async fn annotate_feedback(
        &self,
        session: &SessionId,
        contribution: &ContributionId,
        participant: &ParticipantId,
        helpful: bool,
        note: Option<String>,
    ) -> Result<(), SessionError> {
        let handle = self.registry.get(session).await?;
        self.assistant
            .annotate_feedback(&handle, contribution, participant, helpful, note)
            .await
    }

    // ==================== Reads ====================

    pub async fn snapshot(&self, session: &SessionId) -> Result<SessionSnapshot, SessionError> {
        self.participants.snapshot(session).await
    }

    pub async fn status(&self, session: &SessionId) -> Result<SessionStatus, SessionError> {
        let handle = self.registry.get(session).await?;
        let state = handle.read().await;
        Ok(state.status())
    }

    /// Receive every event broadcast by `session` from now on.
    pub async fn subscribe(
        &self,
        session: &SessionId,
    ) -> Result<broadcast::Receiver<SessionEvent>, SessionError> {
        Ok(self.registry.get(session).await?.subscribe())
    }
}
