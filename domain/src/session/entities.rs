//! Session aggregate
//!
//! A [`Session`] owns the roster, idea log, vote ledger and assistant history
//! of one collaborative run. Every mutating method enforces the lifecycle
//! rules and returns the events that must be broadcast as a result. The type
//! is purely synchronous; callers provide mutual exclusion.

use super::event::{DropReason, SafetyTarget, SessionEvent};
use super::snapshot::SessionSnapshot;
use super::status::SessionStatus;
use crate::assistant::context::ContextWindow;
use crate::assistant::contribution::{
    AssistantContribution, Feedback, Suggestion, TriggerReason, ground_references,
};
use crate::assistant::trigger::{AutoTriggerPolicy, TriggerState};
use crate::core::error::{EntityKind, SessionError};
use crate::core::ids::{ContributionId, IdeaId, ParticipantId, SessionId, WorkspaceId};
use crate::idea::entities::Idea;
use crate::idea::log::IdeaLog;
use crate::participant::entities::{Role, StatusChange};
use crate::participant::roster::{HeartbeatPolicy, JoinOutcome, ReconnectOutcome, Roster};
use crate::quorum::{RankedIdea, VoteChange, VoteLedger, VoteTally, consensus_score, top_rated};
use crate::safety::SafetyReport;
use crate::summary::entities::SessionSummary;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;

/// Per-session rules fixed at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRules {
    pub max_participants: usize,
    pub heartbeat: HeartbeatPolicy,
    pub auto_trigger: AutoTriggerPolicy,
    /// Repeat votes retract instead of being ignored
    pub toggle_votes: bool,
    pub context_window: usize,
    pub min_references: usize,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            max_participants: 10,
            heartbeat: HeartbeatPolicy::default(),
            auto_trigger: AutoTriggerPolicy::default(),
            toggle_votes: false,
            context_window: 10,
            min_references: 3,
        }
    }
}

/// Result of a mutation plus the events it produced
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    pub events: Vec<SessionEvent>,
}

impl<T> Applied<T> {
    fn new(value: T, events: Vec<SessionEvent>) -> Self {
        Self { value, events }
    }
}

/// An appended idea and whether it made the automatic trigger due
#[derive(Debug, Clone)]
pub struct IdeaAccepted {
    pub idea: Idea,
    pub auto_trigger: Option<TriggerReason>,
}

/// The assistant invocation currently in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAssistant {
    pub ticket: u64,
    pub trigger: TriggerReason,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// One bounded collaborative run (Aggregate root)
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    workspace_id: WorkspaceId,
    title: String,
    rules: SessionRules,
    created_at: DateTime<Utc>,
    status: SessionStatus,
    activated_at: Option<DateTime<Utc>>,
    ending_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    last_activity_at: DateTime<Utc>,
    roster: Roster,
    ideas: IdeaLog,
    votes: VoteLedger,
    contributions: Vec<AssistantContribution>,
    trigger: TriggerState,
    pending_assistant: Option<PendingAssistant>,
    next_ticket: u64,
    idea_safety: BTreeMap<IdeaId, SafetyReport>,
    summary: Option<SessionSummary>,
}

impl Session {
    pub fn new(
        id: SessionId,
        workspace_id: WorkspaceId,
        title: impl Into<String>,
        rules: SessionRules,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workspace_id,
            title: title.into(),
            rules,
            created_at: now,
            status: SessionStatus::Forming,
            activated_at: None,
            ending_at: None,
            ended_at: None,
            last_activity_at: now,
            roster: Roster::new(),
            ideas: IdeaLog::new(),
            votes: VoteLedger::new(),
            contributions: Vec::new(),
            trigger: TriggerState::default(),
            pending_assistant: None,
            next_ticket: 1,
            idea_safety: BTreeMap::new(),
            summary: None,
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Start of the session clock: activation, or creation if never activated.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.activated_at.unwrap_or(self.created_at)
    }

    pub fn ending_at(&self) -> Option<DateTime<Utc>> {
        self.ending_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ideas(&self) -> &IdeaLog {
        &self.ideas
    }

    pub fn votes(&self) -> &VoteLedger {
        &self.votes
    }

    pub fn contributions(&self) -> &[AssistantContribution] {
        &self.contributions
    }

    pub fn pending_assistant(&self) -> Option<&PendingAssistant> {
        self.pending_assistant.as_ref()
    }

    pub fn trigger_state(&self) -> &TriggerState {
        &self.trigger
    }

    pub fn idea_safety(&self, idea: &IdeaId) -> Option<&SafetyReport> {
        self.idea_safety.get(idea)
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    // ==================== Lifecycle ====================

    /// Move to `target`.
    ///
    /// Returns `Ok(false)` when already in `target`, so ending twice is
    /// harmless. Backward or skipping moves fail with `InvalidTransition`.
    pub fn transition(
        &mut self,
        target: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<Applied<bool>, SessionError> {
        if self.status == target {
            return Ok(Applied::new(false, Vec::new()));
        }
        if !self.status.can_transition_to(target) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        if target == SessionStatus::Ended && self.summary.is_none() {
            return Err(SessionError::InvalidInput(
                "a session cannot end before its summary is attached".to_string(),
            ));
        }

        let from = self.status;
        self.status = target;
        match target {
            SessionStatus::Active => self.activated_at = Some(now),
            SessionStatus::Ending => self.ending_at = Some(now),
            SessionStatus::Ended => self.ended_at = Some(now),
            SessionStatus::Forming => {}
        }
        self.last_activity_at = now;
        Ok(Applied::new(
            true,
            vec![SessionEvent::StatusChanged { from, to: target, at: now }],
        ))
    }

    /// Attach the summary and close the session.
    ///
    /// Only valid while `ending`. If a summary is already attached it is
    /// returned unchanged.
    pub fn finalize(
        &mut self,
        summary: SessionSummary,
        now: DateTime<Utc>,
    ) -> Result<Applied<SessionSummary>, SessionError> {
        if let Some(existing) = &self.summary {
            return Ok(Applied::new(existing.clone(), Vec::new()));
        }
        if self.status != SessionStatus::Ending {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: SessionStatus::Ended,
            });
        }
        self.summary = Some(summary.clone());
        let mut events = self.transition(SessionStatus::Ended, now)?.events;
        events.push(SessionEvent::SummaryReady {
            summary: summary.clone(),
        });
        Ok(Applied::new(summary, events))
    }

    fn ensure_accepting(&self) -> Result<(), SessionError> {
        if self.status.accepts_contributions() {
            Ok(())
        } else {
            Err(SessionError::StaleOperation(self.status))
        }
    }

    fn ensure_not_ended(&self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            Err(SessionError::StaleOperation(self.status))
        } else {
            Ok(())
        }
    }

    /// Whether the duration ceiling has passed for a session still running.
    pub fn ceiling_reached(&self, max_duration: TimeDelta, now: DateTime<Utc>) -> bool {
        self.status.accepts_contributions() && now - self.started_at() >= max_duration
    }

    /// Whether the registry may drop this session from memory.
    pub fn is_evictable(
        &self,
        ended_retention: TimeDelta,
        forming_idle_ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> bool {
        match self.status {
            SessionStatus::Ended => self
                .ended_at
                .is_some_and(|ended| now - ended >= ended_retention),
            SessionStatus::Forming => {
                self.activated_at.is_none()
                    && self.roster.seated_count() == 0
                    && now - self.last_activity_at >= forming_idle_ttl
            }
            _ => false,
        }
    }

    // ==================== Participants ====================

    pub fn join(
        &mut self,
        participant: ParticipantId,
        display_name: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Applied<JoinOutcome>, SessionError> {
        if !self.status.accepts_participants() {
            return Err(SessionError::SessionEnded(self.status));
        }
        let policy = self.rules.heartbeat;
        let (outcome, _) = self.roster.join(
            participant.clone(),
            display_name,
            role,
            self.rules.max_participants,
            &policy,
            now,
        )?;
        self.last_activity_at = now;

        let mut events = Vec::new();
        if outcome != JoinOutcome::AlreadyConnected
            && let Some(record) = self.roster.get(&participant)
        {
            events.push(SessionEvent::ParticipantJoined {
                participant: record.clone(),
                outcome,
            });
        }
        Ok(Applied::new(outcome, events))
    }

    pub fn heartbeat(
        &mut self,
        participant: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Applied<()>, SessionError> {
        self.ensure_not_ended()?;
        let policy = self.rules.heartbeat;
        let change = self.roster.heartbeat(participant, &policy, now)?;
        Ok(Applied::new((), status_events(change)))
    }

    pub fn reconnect(
        &mut self,
        participant: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Applied<ReconnectOutcome>, SessionError> {
        self.ensure_not_ended()?;
        let policy = self.rules.heartbeat;
        let (outcome, change) = self.roster.reconnect(participant, &policy, now)?;
        self.last_activity_at = now;
        Ok(Applied::new(outcome, status_events(change)))
    }

    /// Explicit exit. Leaving an ended session is a no-op, not an error.
    pub fn leave(
        &mut self,
        participant: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Applied<bool>, SessionError> {
        if self.status.is_terminal() {
            return Ok(Applied::new(false, Vec::new()));
        }
        let change = self.roster.leave(participant, now)?;
        self.last_activity_at = now;
        Ok(Applied::new(change.is_some(), status_events(change)))
    }

    /// Apply heartbeat timeouts. Only connection state is touched.
    pub fn sweep_participants(&mut self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        let policy = self.rules.heartbeat;
        self.roster
            .sweep(&policy, now)
            .into_iter()
            .map(SessionEvent::ParticipantStatusChanged)
            .collect()
    }

    fn authorize(
        &mut self,
        participant: &ParticipantId,
        now: DateTime<Utc>,
        events: &mut Vec<SessionEvent>,
    ) -> Result<(), SessionError> {
        let policy = self.rules.heartbeat;
        let change = self.roster.authorize_contribution(participant, &policy, now)?;
        events.extend(status_events(change));
        Ok(())
    }

    // ==================== Ideas ====================

    /// Append an idea. Not idempotent: every call creates a new entry.
    pub fn contribute_idea(
        &mut self,
        contributor: &ParticipantId,
        text: &str,
        revises: Option<IdeaId>,
        now: DateTime<Utc>,
    ) -> Result<Applied<IdeaAccepted>, SessionError> {
        self.ensure_accepting()?;
        let mut events = Vec::new();
        self.authorize(contributor, now, &mut events)?;

        let idea = self
            .ideas
            .append(contributor.clone(), text, revises, now)?
            .clone();

        if self.status == SessionStatus::Forming {
            events.extend(self.transition(SessionStatus::Active, now)?.events);
        }
        self.last_activity_at = now;
        events.push(SessionEvent::IdeaAppended { idea: idea.clone() });

        let due = self.trigger.record_idea(&self.rules.auto_trigger, now);
        let auto_trigger = (due && self.pending_assistant.is_none()).then(|| {
            TriggerReason::Automatic {
                ideas_since_last: self.trigger.ideas_since_last(),
            }
        });

        Ok(Applied::new(IdeaAccepted { idea, auto_trigger }, events))
    }

    pub fn tail(&self, n: usize) -> &[Idea] {
        self.ideas.tail(n)
    }

    pub fn ideas_since(&self, sequence: u64) -> &[Idea] {
        self.ideas.since(sequence)
    }

    // ==================== Votes ====================

    pub fn vote(
        &mut self,
        idea: &IdeaId,
        voter: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Applied<VoteTally>, SessionError> {
        let mut events = self.prepare_vote(idea, voter, now)?;
        let change = self.votes.cast(idea, voter, self.rules.toggle_votes, now);
        self.finish_vote(idea, voter, change, &mut events);
        Ok(Applied::new(self.votes.tally(idea), events))
    }

    pub fn unvote(
        &mut self,
        idea: &IdeaId,
        voter: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Applied<VoteTally>, SessionError> {
        let mut events = self.prepare_vote(idea, voter, now)?;
        let change = self.votes.retract(idea, voter);
        self.finish_vote(idea, voter, change, &mut events);
        Ok(Applied::new(self.votes.tally(idea), events))
    }

    fn prepare_vote(
        &mut self,
        idea: &IdeaId,
        voter: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        self.ensure_accepting()?;
        if self.ideas.get(idea).is_none() {
            return Err(SessionError::not_found(EntityKind::Idea, idea));
        }
        let mut events = Vec::new();
        self.authorize(voter, now, &mut events)?;
        self.last_activity_at = now;
        Ok(events)
    }

    fn finish_vote(
        &self,
        idea: &IdeaId,
        voter: &ParticipantId,
        change: VoteChange,
        events: &mut Vec<SessionEvent>,
    ) {
        if change.is_noop() {
            return;
        }
        events.push(SessionEvent::VoteTallied {
            idea_id: idea.clone(),
            voter: voter.clone(),
            change,
            votes: self.votes.count(idea),
            consensus_score: self.consensus_score(),
        });
    }

    pub fn consensus_score(&self) -> f64 {
        consensus_score(&self.ideas, &self.votes, self.roster.voting_member_count())
    }

    pub fn top_rated(&self, k: usize) -> Vec<RankedIdea> {
        top_rated(&self.ideas, &self.votes, k)
    }

    /// Tallies for every idea, in sequence order.
    pub fn tallies(&self) -> Vec<VoteTally> {
        self.ideas
            .all()
            .iter()
            .map(|idea| self.votes.tally(&idea.id))
            .collect()
    }

    // ==================== Assistant ====================

    pub fn context_window(&self, now: DateTime<Utc>) -> ContextWindow {
        ContextWindow::build(
            &self.id,
            &self.ideas,
            &self.contributions,
            self.rules.context_window,
            now,
        )
    }

    /// Validate an explicit request from a participant.
    pub fn authorize_assistant_request(
        &mut self,
        requester: &ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        self.ensure_accepting()?;
        let mut events = Vec::new();
        self.authorize(requester, now, &mut events)?;
        Ok(events)
    }

    /// Reserve the assistant for one invocation.
    ///
    /// Returns `None` when another invocation is already in flight and has
    /// not passed its deadline; the caller's trigger is coalesced into it.
    pub fn begin_assistant(
        &mut self,
        trigger: TriggerReason,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingAssistant>, SessionError> {
        self.ensure_accepting()?;
        if let Some(pending) = &self.pending_assistant
            && now < pending.deadline
        {
            return Ok(None);
        }
        let pending = PendingAssistant {
            ticket: self.next_ticket,
            trigger,
            started_at: now,
            deadline,
        };
        self.next_ticket += 1;
        self.pending_assistant = Some(pending.clone());
        Ok(Some(pending))
    }

    /// Acknowledge an explicit request that was folded into the in-flight
    /// invocation. Automatic triggers coalesce silently.
    pub fn coalesced_notice(
        &self,
        trigger: TriggerReason,
        now: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        if !matches!(trigger, TriggerReason::Requested { .. }) {
            return None;
        }
        let pending = self.pending_assistant.as_ref()?;
        Some(SessionEvent::AssistantComposing {
            ticket: pending.ticket,
            trigger,
            at: now,
        })
    }

    fn is_current_ticket(&self, ticket: u64) -> bool {
        self.pending_assistant
            .as_ref()
            .is_some_and(|p| p.ticket == ticket)
    }

    /// Placeholder for an invocation that missed the SLA window.
    pub fn composing_notice(&self, ticket: u64, now: DateTime<Utc>) -> Option<SessionEvent> {
        if !self.status.accepts_contributions() {
            return None;
        }
        let pending = self.pending_assistant.as_ref().filter(|p| p.ticket == ticket)?;
        Some(SessionEvent::AssistantComposing {
            ticket,
            trigger: pending.trigger.clone(),
            at: now,
        })
    }

    /// Publish a suggestion produced for `ticket` from `window`.
    ///
    /// Results for a session that stopped accepting contributions, or for a
    /// ticket that is no longer current, are rejected as stale. The ticket
    /// stays reserved until `abandon_assistant` releases it.
    pub fn publish_suggestion(
        &mut self,
        ticket: u64,
        suggestion: Suggestion,
        window: ContextWindow,
        now: DateTime<Utc>,
    ) -> Result<Applied<AssistantContribution>, SessionError> {
        if !self.status.accepts_contributions() {
            return Err(SessionError::StaleOperation(self.status));
        }
        let trigger = match &self.pending_assistant {
            Some(pending) if pending.ticket == ticket => pending.trigger.clone(),
            _ => return Err(SessionError::StaleOperation(self.status)),
        };
        let text = suggestion.text.trim();
        if text.is_empty() {
            return Err(SessionError::ExternalFailure(
                "suggestion capability returned empty text".to_string(),
            ));
        }

        let required = window.required_references(self.rules.min_references);
        let grounded =
            ground_references(&suggestion.referenced_ideas, &window, &self.ideas, required);
        self.pending_assistant = None;

        let contribution = AssistantContribution {
            id: ContributionId::generate(),
            text: text.to_string(),
            referenced_ideas: grounded.ideas,
            confidence: suggestion.confidence.clamp(0.0, 1.0),
            created_at: now,
            trigger,
            after_sequence: window.through_sequence,
            context: window,
            feedback: BTreeMap::new(),
            safety: None,
        };
        for idea in &contribution.referenced_ideas {
            self.ideas.record_citation(idea, &contribution.id);
        }
        self.trigger.reset();
        self.contributions.push(contribution.clone());
        self.last_activity_at = now;

        let events = vec![SessionEvent::AssistantContributed {
            ticket,
            contribution: contribution.clone(),
        }];
        Ok(Applied::new(contribution, events))
    }

    /// Release the assistant after a failed, late or discarded invocation.
    pub fn abandon_assistant(&mut self, ticket: u64, reason: DropReason) -> Option<SessionEvent> {
        if !self.is_current_ticket(ticket) {
            return None;
        }
        self.pending_assistant = None;
        Some(SessionEvent::AssistantDropped { ticket, reason })
    }

    pub fn annotate_feedback(
        &mut self,
        contribution: &ContributionId,
        participant: &ParticipantId,
        helpful: bool,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Applied<()>, SessionError> {
        self.ensure_not_ended()?;
        if !self
            .roster
            .get(participant)
            .is_some_and(|p| p.holds_seat())
        {
            return Err(SessionError::NotActive(participant.to_string()));
        }
        let target = self
            .contributions
            .iter_mut()
            .find(|c| &c.id == contribution)
            .ok_or_else(|| SessionError::not_found(EntityKind::Contribution, contribution))?;

        let feedback = Feedback {
            helpful,
            note: note.filter(|n| !n.trim().is_empty()),
            at: now,
        };
        target
            .feedback
            .insert(participant.clone(), feedback.clone());
        Ok(Applied::new(
            (),
            vec![SessionEvent::FeedbackRecorded {
                contribution_id: contribution.clone(),
                participant_id: participant.clone(),
                feedback,
            }],
        ))
    }

    // ==================== Safety metadata ====================

    pub fn attach_safety(
        &mut self,
        target: SafetyTarget,
        report: SafetyReport,
    ) -> Result<Option<SessionEvent>, SessionError> {
        self.ensure_not_ended()?;
        match &target {
            SafetyTarget::Idea(id) => {
                if self.ideas.get(id).is_none() {
                    return Err(SessionError::not_found(EntityKind::Idea, id));
                }
                self.idea_safety.insert(id.clone(), report.clone());
            }
            SafetyTarget::Contribution(id) => {
                let contribution = self
                    .contributions
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| SessionError::not_found(EntityKind::Contribution, id))?;
                contribution.safety = Some(report.clone());
            }
        }
        Ok((!report.is_clean()).then_some(SessionEvent::SafetyFlagged { target, report }))
    }

    // ==================== Reads ====================

    pub fn snapshot(&self, idea_tail: usize, assistant_tail: usize) -> SessionSnapshot {
        let skip = self.contributions.len().saturating_sub(assistant_tail);
        SessionSnapshot {
            session_id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            last_sequence: self.ideas.last_sequence(),
            participants: self.roster.iter().cloned().collect(),
            idea_tail: self.ideas.tail(idea_tail).to_vec(),
            tallies: self.tallies(),
            top_rated: self.top_rated(3),
            consensus_score: self.consensus_score(),
            assistant_tail: self.contributions[skip..].to_vec(),
            assistant_pending: self.pending_assistant.is_some(),
            summary_available: self.summary.is_some(),
        }
    }
}

fn status_events(change: Option<StatusChange>) -> Vec<SessionEvent> {
    change
        .map(SessionEvent::ParticipantStatusChanged)
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::compile::{SummaryPolicy, compile_summary};
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn session() -> Session {
        Session::new(
            SessionId::new("s1"),
            WorkspaceId::new("w1"),
            "Launch retro",
            SessionRules::default(),
            t(0),
        )
    }

    fn seated(names: &[&str]) -> Session {
        let mut s = session();
        for (i, name) in names.iter().enumerate() {
            let role = if i == 0 { Role::Initiator } else { Role::Contributor };
            s.join(pid(name), name, role, t(0)).unwrap();
        }
        s
    }

    fn add_idea(s: &mut Session, who: &str, text: &str, at: i64) -> Idea {
        s.contribute_idea(&pid(who), text, None, t(at)).unwrap().value.idea
    }

    fn end(s: &mut Session, at: i64) -> SessionSummary {
        s.transition(SessionStatus::Ending, t(at)).unwrap();
        let summary = compile_summary(s, Vec::new(), false, &SummaryPolicy::default()).unwrap();
        s.finalize(summary, t(at)).unwrap().value
    }

    #[test]
    fn test_first_idea_activates_session() {
        let mut s = seated(&["ana"]);
        assert_eq!(s.status(), SessionStatus::Forming);

        let applied = s.contribute_idea(&pid("ana"), "ship it", None, t(5)).unwrap();
        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.started_at(), t(5));
        assert!(matches!(applied.events[0], SessionEvent::StatusChanged { .. }));
        assert!(matches!(applied.events[1], SessionEvent::IdeaAppended { .. }));
    }

    #[test]
    fn test_transition_rules() {
        let mut s = seated(&["ana"]);
        assert!(s.transition(SessionStatus::Active, t(1)).unwrap().value);
        assert!(!s.transition(SessionStatus::Active, t(2)).unwrap().value);

        let err = s.transition(SessionStatus::Forming, t(3)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));

        // Ended is only reachable through finalize.
        s.transition(SessionStatus::Ending, t(4)).unwrap();
        assert!(s.transition(SessionStatus::Ended, t(5)).is_err());
    }

    #[test]
    fn test_join_rejected_after_wind_down() {
        let mut s = seated(&["ana"]);
        s.transition(SessionStatus::Ending, t(1)).unwrap();
        let err = s.join(pid("bo"), "bo", Role::Contributor, t(2)).unwrap_err();
        assert_eq!(err, SessionError::SessionEnded(SessionStatus::Ending));
    }

    #[test]
    fn test_seat_cap() {
        let mut s = Session::new(
            SessionId::new("s"),
            WorkspaceId::new("w"),
            "",
            SessionRules {
                max_participants: 2,
                ..SessionRules::default()
            },
            t(0),
        );
        s.join(pid("a"), "a", Role::Initiator, t(0)).unwrap();
        s.join(pid("b"), "b", Role::Contributor, t(0)).unwrap();
        let err = s.join(pid("c"), "c", Role::Contributor, t(0)).unwrap_err();
        assert!(err.is_capacity());

        // Repeat join for a seated participant does not need a free seat.
        let again = s.join(pid("b"), "b", Role::Contributor, t(1)).unwrap();
        assert_eq!(again.value, JoinOutcome::AlreadyConnected);
        assert!(again.events.is_empty());
    }

    #[test]
    fn test_ideas_rejected_while_ending() {
        let mut s = seated(&["ana"]);
        add_idea(&mut s, "ana", "one", 1);
        s.transition(SessionStatus::Ending, t(2)).unwrap();

        let err = s.contribute_idea(&pid("ana"), "late", None, t(3)).unwrap_err();
        assert!(err.is_stale());
        assert_eq!(s.ideas().len(), 1);
    }

    #[test]
    fn test_observer_cannot_contribute() {
        let mut s = seated(&["ana"]);
        s.join(pid("obs"), "obs", Role::Observer, t(0)).unwrap();
        let err = s.contribute_idea(&pid("obs"), "hello", None, t(1)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(_)));
    }

    #[test]
    fn test_votes_and_consensus() {
        let mut s = seated(&["a", "b", "c", "d"]);
        let x = add_idea(&mut s, "a", "x", 1);
        add_idea(&mut s, "b", "y", 2);

        for voter in ["a", "b", "c"] {
            s.vote(&x.id, &pid(voter), t(3)).unwrap();
        }
        assert!((s.consensus_score() - 0.75).abs() < 1e-9);

        let repeat = s.vote(&x.id, &pid("a"), t(4)).unwrap();
        assert_eq!(repeat.value.votes, 3);
        assert!(repeat.events.is_empty());

        let retracted = s.unvote(&x.id, &pid("c"), t(5)).unwrap();
        assert_eq!(retracted.value.votes, 2);
        assert_eq!(s.top_rated(1)[0].idea_id, x.id);
    }

    #[test]
    fn test_vote_unknown_idea() {
        let mut s = seated(&["a"]);
        let err = s.vote(&IdeaId::new("nope"), &pid("a"), t(1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_disconnected_voter_is_reconnected() {
        let mut s = seated(&["a", "b"]);
        let x = add_idea(&mut s, "a", "x", 1);
        let swept = s.sweep_participants(t(61));
        assert_eq!(swept.len(), 2);

        let applied = s.vote(&x.id, &pid("b"), t(62)).unwrap();
        assert!(matches!(
            applied.events[0],
            SessionEvent::ParticipantStatusChanged(_)
        ));
        assert!(s.roster().get(&pid("b")).unwrap().is_connected());
    }

    #[test]
    fn test_auto_trigger_and_in_flight_guard() {
        let mut s = seated(&["a"]);
        let mut due = None;
        for i in 0..5 {
            let accepted = s
                .contribute_idea(&pid("a"), &format!("idea {i}"), None, t(i))
                .unwrap()
                .value;
            due = accepted.auto_trigger;
        }
        let reason = due.expect("fifth idea should trigger");
        assert_eq!(reason, TriggerReason::Automatic { ideas_since_last: 5 });

        let pending = s.begin_assistant(reason, t(10), t(5)).unwrap().unwrap();
        assert_eq!(pending.ticket, 1);

        // Another idea while in flight does not request a second run.
        let accepted = s.contribute_idea(&pid("a"), "more", None, t(6)).unwrap().value;
        assert!(accepted.auto_trigger.is_none());
        assert!(
            s.begin_assistant(TriggerReason::Requested { by: pid("a") }, t(20), t(6))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_publish_grounds_references_and_resets_trigger() {
        let mut s = seated(&["a"]);
        let ideas: Vec<Idea> = (0..5)
            .map(|i| add_idea(&mut s, "a", &format!("idea {i}"), i))
            .collect();
        let pending = s
            .begin_assistant(TriggerReason::Requested { by: pid("a") }, t(20), t(6))
            .unwrap()
            .unwrap();
        let window = s.context_window(t(6));

        let suggestion = Suggestion::new(
            "combine the last two",
            vec![ideas[0].id.clone(), IdeaId::new("ghost")],
            0.6,
        );
        let applied = s
            .publish_suggestion(pending.ticket, suggestion, window, t(7))
            .unwrap();
        let contribution = applied.value;

        assert_eq!(contribution.referenced_ideas.len(), 3);
        assert_eq!(contribution.referenced_ideas[0], ideas[0].id);
        assert!(contribution.referenced_ideas.contains(&ideas[4].id));
        assert_eq!(s.ideas().citations(&ideas[0].id), vec![contribution.id.clone()]);
        assert_eq!(s.trigger_state().ideas_since_last(), 0);
        assert!(s.pending_assistant().is_none());
    }

    #[test]
    fn test_publish_after_ending_is_stale() {
        let mut s = seated(&["a"]);
        add_idea(&mut s, "a", "x", 1);
        let pending = s
            .begin_assistant(TriggerReason::Requested { by: pid("a") }, t(20), t(2))
            .unwrap()
            .unwrap();
        let window = s.context_window(t(2));
        s.transition(SessionStatus::Ending, t(3)).unwrap();

        let err = s
            .publish_suggestion(pending.ticket, Suggestion::new("late", vec![], 0.5), window, t(4))
            .unwrap_err();
        assert!(err.is_stale());
        assert!(s.contributions().is_empty());

        let dropped = s.abandon_assistant(pending.ticket, DropReason::from(&err));
        assert!(matches!(
            dropped,
            Some(SessionEvent::AssistantDropped { reason: DropReason::SessionClosed, .. })
        ));
        assert!(s.pending_assistant().is_none());
    }

    #[test]
    fn test_abandon_releases_assistant() {
        let mut s = seated(&["a"]);
        add_idea(&mut s, "a", "x", 1);
        let pending = s
            .begin_assistant(TriggerReason::Requested { by: pid("a") }, t(20), t(2))
            .unwrap()
            .unwrap();
        assert!(s.composing_notice(pending.ticket, t(4)).is_some());

        let dropped = s.abandon_assistant(pending.ticket, DropReason::DeadlineExceeded);
        assert!(dropped.is_some());
        assert!(s.abandon_assistant(pending.ticket, DropReason::DeadlineExceeded).is_none());
        assert!(s.composing_notice(pending.ticket, t(5)).is_none());
    }

    #[test]
    fn test_feedback_requires_seat() {
        let mut s = seated(&["a", "b"]);
        add_idea(&mut s, "a", "x", 1);
        let pending = s
            .begin_assistant(TriggerReason::Requested { by: pid("a") }, t(20), t(2))
            .unwrap()
            .unwrap();
        let window = s.context_window(t(2));
        let c = s
            .publish_suggestion(pending.ticket, Suggestion::new("try y", vec![], 0.5), window, t(3))
            .unwrap()
            .value;

        s.annotate_feedback(&c.id, &pid("a"), true, Some("nice".into()), t(4))
            .unwrap();
        s.leave(&pid("b"), t(5)).unwrap();
        let err = s
            .annotate_feedback(&c.id, &pid("b"), false, None, t(6))
            .unwrap_err();
        assert!(matches!(err, SessionError::NotActive(_)));
        assert_eq!(s.contributions()[0].helpful_count(), 1);
    }

    #[test]
    fn test_safety_flag_emits_event_only_when_flagged() {
        let mut s = seated(&["a"]);
        let x = add_idea(&mut s, "a", "x", 1);
        let clean = s
            .attach_safety(SafetyTarget::Idea(x.id.clone()), SafetyReport::clean(t(2)))
            .unwrap();
        assert!(clean.is_none());

        let flagged = SafetyReport {
            flags: vec!["pii:email".into()],
            requires_review: true,
            scanned_at: t(3),
        };
        let event = s
            .attach_safety(SafetyTarget::Idea(x.id.clone()), flagged)
            .unwrap();
        assert!(matches!(event, Some(SessionEvent::SafetyFlagged { .. })));
        assert!(!s.idea_safety(&x.id).unwrap().is_clean());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut s = seated(&["a"]);
        add_idea(&mut s, "a", "x", 1);
        let first = end(&mut s, 10);
        assert_eq!(s.status(), SessionStatus::Ended);

        let other = compile_summary(&s, Vec::new(), true, &SummaryPolicy::default()).unwrap();
        let second = s.finalize(other, t(20)).unwrap();
        assert_eq!(second.value, first);
        assert!(second.events.is_empty());
        assert_eq!(s.ended_at(), Some(t(10)));
    }

    #[test]
    fn test_ended_session_rejects_mutation() {
        let mut s = seated(&["a"]);
        let x = add_idea(&mut s, "a", "x", 1);
        end(&mut s, 10);

        assert!(s.vote(&x.id, &pid("a"), t(11)).unwrap_err().is_stale());
        assert!(s.heartbeat(&pid("a"), t(11)).unwrap_err().is_stale());
        assert!(!s.leave(&pid("a"), t(11)).unwrap().value);
        assert!(s.sweep_participants(t(1000)).is_empty());
    }

    #[test]
    fn test_eviction_rules() {
        let retention = TimeDelta::seconds(600);
        let idle = TimeDelta::seconds(900);

        let empty = session();
        assert!(!empty.is_evictable(retention, idle, t(899)));
        assert!(empty.is_evictable(retention, idle, t(900)));

        let occupied = seated(&["a"]);
        assert!(!occupied.is_evictable(retention, idle, t(10_000)));

        let mut ended = seated(&["a"]);
        add_idea(&mut ended, "a", "x", 1);
        end(&mut ended, 10);
        assert!(!ended.is_evictable(retention, idle, t(609)));
        assert!(ended.is_evictable(retention, idle, t(610)));
    }

    #[test]
    fn test_ceiling_measured_from_activation() {
        let mut s = seated(&["a"]);
        add_idea(&mut s, "a", "x", 100);
        let ceiling = TimeDelta::minutes(20);
        assert!(!s.ceiling_reached(ceiling, t(100 + 1199)));
        assert!(s.ceiling_reached(ceiling, t(100 + 1200)));
    }

    #[test]
    fn test_snapshot() {
        let mut s = seated(&["a", "b"]);
        for i in 0..4 {
            add_idea(&mut s, "a", &format!("idea {i}"), i);
        }
        let snap = s.snapshot(2, 5);
        assert_eq!(snap.status, SessionStatus::Active);
        assert_eq!(snap.last_sequence, 4);
        assert_eq!(snap.participants.len(), 2);
        assert_eq!(snap.idea_tail.len(), 2);
        assert_eq!(snap.idea_tail[1].sequence, 4);
        assert_eq!(snap.tallies.len(), 4);
        assert!(!snap.summary_available);
        assert_eq!(s.ideas_since(2).len(), 2);
    }
}
