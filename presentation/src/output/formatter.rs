//! Output formatter trait

use huddle_domain::{SessionEvent, SessionSummary};

/// Trait for rendering session events and summaries
pub trait OutputFormatter {
    /// One line per event, for live output
    fn format_event(&self, event: &SessionEvent) -> String;

    /// The complete summary
    fn format(&self, summary: &SessionSummary) -> String;

    /// Format as JSON
    fn format_json(&self, summary: &SessionSummary) -> String;

    /// The content brief only (concise output)
    fn format_brief(&self, summary: &SessionSummary) -> String;
}
