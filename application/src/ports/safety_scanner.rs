//! Safety scan port
//!
//! Scans run off the hot path; their verdicts are attached to ideas and
//! assistant contributions as metadata after the fact.

use super::capability::CapabilityError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use huddle_domain::SafetyReport;

/// Raw result of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub flags: Vec<String>,
    pub requires_review: bool,
}

impl SafetyVerdict {
    pub fn into_report(self, scanned_at: DateTime<Utc>) -> SafetyReport {
        SafetyReport {
            flags: self.flags,
            requires_review: self.requires_review,
            scanned_at,
        }
    }
}

#[async_trait]
pub trait SafetyScanner: Send + Sync {
    async fn scan(&self, text: &str) -> Result<SafetyVerdict, CapabilityError>;
}

/// Scanner that never flags anything
pub struct NoSafetyScan;

#[async_trait]
impl SafetyScanner for NoSafetyScan {
    async fn scan(&self, _text: &str) -> Result<SafetyVerdict, CapabilityError> {
        Ok(SafetyVerdict::default())
    }
}
