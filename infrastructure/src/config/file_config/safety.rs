//! Safety scan configuration from TOML (`[safety]` section)

use serde::{Deserialize, Serialize};

/// Raw safety scan configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSafetyConfig {
    /// Scan ideas and assistant contributions after they are published
    pub enabled: bool,
    /// Whole-word terms that mark a text for review
    pub blocked_terms: Vec<String>,
}

impl Default for FileSafetyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_terms: Vec::new(),
        }
    }
}
