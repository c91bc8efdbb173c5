//! Session lifecycle configuration from TOML (`[session]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Concurrent sessions per workspace that have not ended
    pub max_sessions_per_workspace: usize,
    /// Duration ceiling, in minutes, after which a session is ended
    pub max_duration_mins: u64,
    /// How long an ended session stays readable
    pub ended_retention_secs: u64,
    /// Idle time after which an empty, never-active session is dropped
    pub forming_idle_ttl_secs: u64,
    pub reap_interval_secs: u64,
    /// Buffered events per subscriber before it starts lagging
    pub broadcast_capacity: usize,
    /// A repeat vote retracts instead of being ignored
    pub toggle_votes: bool,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_workspace: 25,
            max_duration_mins: 20,
            ended_retention_secs: 600,
            forming_idle_ttl_secs: 900,
            reap_interval_secs: 30,
            broadcast_capacity: 256,
            toggle_votes: false,
        }
    }
}
