//! Participant configuration from TOML (`[participants]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileParticipantsConfig {
    pub max_participants: usize,
    pub heartbeat_interval_secs: u64,
    pub missed_heartbeats_before_disconnect: u32,
    pub reconnect_grace_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for FileParticipantsConfig {
    fn default() -> Self {
        Self {
            max_participants: 10,
            heartbeat_interval_secs: 30,
            missed_heartbeats_before_disconnect: 2,
            reconnect_grace_secs: 300,
            sweep_interval_secs: 5,
        }
    }
}
