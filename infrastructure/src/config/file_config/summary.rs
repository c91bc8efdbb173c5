//! Summary configuration from TOML (`[summary]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSummaryConfig {
    /// Quorum rule for headline ideas: "majority", "N%" or "at_least:N"
    pub headline_rule: String,
    pub extraction_timeout_secs: u64,
}

impl Default for FileSummaryConfig {
    fn default() -> Self {
        Self {
            headline_rule: "majority".to_string(),
            extraction_timeout_secs: 10,
        }
    }
}
