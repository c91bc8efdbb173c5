//! Safety scan results attached to ideas and assistant output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a compliance scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub flags: Vec<String>,
    pub requires_review: bool,
    pub scanned_at: DateTime<Utc>,
}

impl SafetyReport {
    pub fn clean(now: DateTime<Utc>) -> Self {
        Self {
            flags: Vec::new(),
            requires_review: false,
            scanned_at: now,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty() && !self.requires_review
    }
}
