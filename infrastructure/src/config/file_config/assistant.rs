//! Assistant configuration from TOML (`[assistant]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAssistantConfig {
    /// Time until a triggered assistant must be visibly answering
    pub sla_ms: u64,
    /// Time after which an unanswered invocation is dropped
    pub request_deadline_secs: u64,
    pub auto_trigger_every: usize,
    pub context_window: usize,
    pub min_references: usize,
    pub velocity_window_secs: u64,
    pub max_ideas_per_window: usize,
    pub max_trigger_threshold: usize,
    /// Suggestion backend: "extractive" or "http"
    pub provider: String,
    /// Endpoint for the "http" provider
    pub endpoint: Option<String>,
    /// Client-side timeout of the "http" provider
    pub http_timeout_secs: u64,
}

impl Default for FileAssistantConfig {
    fn default() -> Self {
        Self {
            sla_ms: 2000,
            request_deadline_secs: 30,
            auto_trigger_every: 5,
            context_window: 10,
            min_references: 3,
            velocity_window_secs: 60,
            max_ideas_per_window: 12,
            max_trigger_threshold: 20,
            provider: "extractive".to_string(),
            endpoint: None,
            http_timeout_secs: 20,
        }
    }
}
