//! Session journal configuration from TOML (`[journal]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJournalConfig {
    pub enabled: bool,
    /// Directory receiving one `<timestamp>.journal.jsonl` file per run
    pub dir: String,
}

impl Default for FileJournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: ".huddle/journal".to_string(),
        }
    }
}
