//! Engine configuration.
//!
//! [`EngineConfig`] groups every tunable of the session engine. The
//! infrastructure layer builds it from config files; tests build it directly
//! with the builder methods.

use chrono::TimeDelta;
use huddle_domain::{
    AutoTriggerPolicy, HeartbeatPolicy, QuorumRule, SessionRules, SummaryPolicy,
};
use std::time::Duration;

/// Runtime parameters of the session engine.
///
/// | Group        | Fields                                                    |
/// |--------------|-----------------------------------------------------------|
/// | Registry     | `max_sessions_per_workspace`, retention, idle TTL         |
/// | Participants | seat cap, heartbeat interval, missed beats, grace         |
/// | Assistant    | SLA, request deadline, trigger cadence, window, backoff   |
/// | Summary      | duration ceiling, headline rule, extraction timeout       |
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_sessions_per_workspace: usize,
    pub ended_retention: Duration,
    pub forming_idle_ttl: Duration,
    pub reap_interval: Duration,
    pub broadcast_capacity: usize,

    pub max_participants: usize,
    pub heartbeat_interval: Duration,
    pub missed_heartbeats_before_disconnect: u32,
    pub reconnect_grace: Duration,
    /// How often the per-session sweeper runs
    pub sweep_interval: Duration,

    pub assistant_sla: Duration,
    pub assistant_request_deadline: Duration,
    pub auto_trigger_every: usize,
    pub context_window: usize,
    pub min_references: usize,
    pub velocity_window: Duration,
    pub max_ideas_per_window: usize,
    pub max_trigger_threshold: usize,

    pub toggle_votes: bool,

    pub max_duration: Duration,
    pub headline_rule: QuorumRule,
    pub extraction_timeout: Duration,

    pub snapshot_idea_tail: usize,
    pub snapshot_assistant_tail: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_workspace: 25,
            ended_retention: Duration::from_secs(600),
            forming_idle_ttl: Duration::from_secs(900),
            reap_interval: Duration::from_secs(30),
            broadcast_capacity: 256,

            max_participants: 10,
            heartbeat_interval: Duration::from_secs(30),
            missed_heartbeats_before_disconnect: 2,
            reconnect_grace: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(5),

            assistant_sla: Duration::from_millis(2000),
            assistant_request_deadline: Duration::from_secs(30),
            auto_trigger_every: 5,
            context_window: 10,
            min_references: 3,
            velocity_window: Duration::from_secs(60),
            max_ideas_per_window: 12,
            max_trigger_threshold: 20,

            toggle_votes: false,

            max_duration: Duration::from_secs(20 * 60),
            headline_rule: QuorumRule::Majority,
            extraction_timeout: Duration::from_secs(10),

            snapshot_idea_tail: 50,
            snapshot_assistant_tail: 10,
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }

    pub fn with_max_sessions_per_workspace(mut self, max: usize) -> Self {
        self.max_sessions_per_workspace = max;
        self
    }

    pub fn with_assistant_sla(mut self, sla: Duration) -> Self {
        self.assistant_sla = sla;
        self
    }

    pub fn with_assistant_request_deadline(mut self, deadline: Duration) -> Self {
        self.assistant_request_deadline = deadline;
        self
    }

    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = max;
        self
    }

    pub fn with_toggle_votes(mut self, toggle: bool) -> Self {
        self.toggle_votes = toggle;
        self
    }

    pub fn with_headline_rule(mut self, rule: QuorumRule) -> Self {
        self.headline_rule = rule;
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    // ==================== Domain Policies ====================

    pub fn heartbeat_policy(&self) -> HeartbeatPolicy {
        HeartbeatPolicy {
            interval: delta(self.heartbeat_interval),
            missed_before_disconnect: self.missed_heartbeats_before_disconnect,
            grace: delta(self.reconnect_grace),
        }
    }

    pub fn auto_trigger_policy(&self) -> AutoTriggerPolicy {
        AutoTriggerPolicy {
            base_every: self.auto_trigger_every,
            velocity_window: delta(self.velocity_window),
            max_ideas_per_window: self.max_ideas_per_window,
            max_threshold: self.max_trigger_threshold,
        }
    }

    pub fn session_rules(&self) -> SessionRules {
        SessionRules {
            max_participants: self.max_participants,
            heartbeat: self.heartbeat_policy(),
            auto_trigger: self.auto_trigger_policy(),
            toggle_votes: self.toggle_votes,
            context_window: self.context_window,
            min_references: self.min_references,
        }
    }

    pub fn summary_policy(&self) -> SummaryPolicy {
        SummaryPolicy {
            headline_rule: self.headline_rule,
            ..SummaryPolicy::default()
        }
    }
}

/// Convert a std duration for domain arithmetic.
pub fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = EngineConfig::default();
        assert_eq!(config.max_participants, 10);
        assert_eq!(config.assistant_sla, Duration::from_secs(2));
        assert_eq!(config.max_duration, Duration::from_secs(1200));
        assert!(!config.toggle_votes);
    }

    #[test]
    fn test_heartbeat_policy() {
        let policy = EngineConfig::default().heartbeat_policy();
        assert_eq!(policy.disconnect_after(), TimeDelta::seconds(60));
        assert_eq!(policy.leave_after(), TimeDelta::seconds(360));
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .with_max_participants(3)
            .with_toggle_votes(true)
            .with_headline_rule(QuorumRule::AtLeast(2));

        let rules = config.session_rules();
        assert_eq!(rules.max_participants, 3);
        assert!(rules.toggle_votes);
        assert_eq!(config.summary_policy().headline_rule, QuorumRule::AtLeast(2));
    }
}
