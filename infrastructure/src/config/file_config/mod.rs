//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! [`EngineConfig`] once validated.

mod assistant;
mod journal;
mod output;
mod participants;
mod safety;
mod session;
mod summary;

pub use assistant::FileAssistantConfig;
pub use journal::FileJournalConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use participants::FileParticipantsConfig;
pub use safety::FileSafetyConfig;
pub use session::FileSessionConfig;
pub use summary::FileSummaryConfig;

use huddle_application::EngineConfig;
use huddle_domain::QuorumRule;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    ZeroValue { field: &'static str },

    #[error("summary.headline_rule: {0}")]
    InvalidHeadlineRule(String),

    #[error("assistant.sla_ms ({sla_ms}) must be below assistant.request_deadline_secs ({deadline_secs}s)")]
    SlaExceedsDeadline { sla_ms: u64, deadline_secs: u64 },

    #[error("assistant.provider: unknown provider '{0}' (expected 'extractive' or 'http')")]
    UnknownProvider(String),

    #[error("assistant.endpoint is required when assistant.provider = \"http\"")]
    MissingEndpoint,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub session: FileSessionConfig,
    pub participants: FileParticipantsConfig,
    pub assistant: FileAssistantConfig,
    pub summary: FileSummaryConfig,
    pub safety: FileSafetyConfig,
    pub journal: FileJournalConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        let non_zero: [(&'static str, u64); 9] = [
            ("session.max_sessions_per_workspace", self.session.max_sessions_per_workspace as u64),
            ("session.max_duration_mins", self.session.max_duration_mins),
            ("session.broadcast_capacity", self.session.broadcast_capacity as u64),
            ("participants.max_participants", self.participants.max_participants as u64),
            ("participants.heartbeat_interval_secs", self.participants.heartbeat_interval_secs),
            ("participants.sweep_interval_secs", self.participants.sweep_interval_secs),
            ("assistant.sla_ms", self.assistant.sla_ms),
            ("assistant.auto_trigger_every", self.assistant.auto_trigger_every as u64),
            ("assistant.context_window", self.assistant.context_window as u64),
        ];
        issues.extend(
            non_zero
                .into_iter()
                .filter(|(_, value)| *value == 0)
                .map(|(field, _)| ConfigValidationError::ZeroValue { field }),
        );

        if self.assistant.sla_ms >= self.assistant.request_deadline_secs.saturating_mul(1000) {
            issues.push(ConfigValidationError::SlaExceedsDeadline {
                sla_ms: self.assistant.sla_ms,
                deadline_secs: self.assistant.request_deadline_secs,
            });
        }

        if let Err(e) = self.summary.headline_rule.parse::<QuorumRule>() {
            issues.push(ConfigValidationError::InvalidHeadlineRule(e.to_string()));
        }

        match self.assistant.provider.as_str() {
            "extractive" => {}
            "http" if self.assistant.endpoint.as_deref().is_none_or(str::is_empty) => {
                issues.push(ConfigValidationError::MissingEndpoint);
            }
            "http" => {}
            other => issues.push(ConfigValidationError::UnknownProvider(other.to_string())),
        }

        issues
    }

    /// Build the engine configuration. Invalid values that `validate`
    /// reports fall back to their defaults.
    pub fn into_engine_config(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        let secs = Duration::from_secs;

        EngineConfig {
            max_sessions_per_workspace: self.session.max_sessions_per_workspace,
            ended_retention: secs(self.session.ended_retention_secs),
            forming_idle_ttl: secs(self.session.forming_idle_ttl_secs),
            reap_interval: secs(self.session.reap_interval_secs.max(1)),
            broadcast_capacity: self.session.broadcast_capacity.max(1),

            max_participants: self.participants.max_participants,
            heartbeat_interval: secs(self.participants.heartbeat_interval_secs),
            missed_heartbeats_before_disconnect: self
                .participants
                .missed_heartbeats_before_disconnect,
            reconnect_grace: secs(self.participants.reconnect_grace_secs),
            sweep_interval: secs(self.participants.sweep_interval_secs.max(1)),

            assistant_sla: Duration::from_millis(self.assistant.sla_ms),
            assistant_request_deadline: secs(self.assistant.request_deadline_secs),
            auto_trigger_every: self.assistant.auto_trigger_every.max(1),
            context_window: self.assistant.context_window,
            min_references: self.assistant.min_references,
            velocity_window: secs(self.assistant.velocity_window_secs),
            max_ideas_per_window: self.assistant.max_ideas_per_window,
            max_trigger_threshold: self.assistant.max_trigger_threshold,

            toggle_votes: self.session.toggle_votes,

            max_duration: secs(self.session.max_duration_mins.saturating_mul(60)),
            headline_rule: self
                .summary
                .headline_rule
                .parse()
                .unwrap_or(defaults.headline_rule),
            extraction_timeout: secs(self.summary.extraction_timeout_secs),

            ..defaults
        }
    }
}
