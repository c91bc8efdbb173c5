//! Suggestion capability port
//!
//! The assistant's only way to produce content. Calls may take arbitrarily
//! long; the scheduler enforces its own deadline around them.

use super::capability::CapabilityError;
use async_trait::async_trait;
use huddle_domain::{ContextWindow, Suggestion};

/// Produces a suggestion grounded on a context window
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str {
        "suggestion"
    }

    async fn suggest(&self, window: &ContextWindow) -> Result<Suggestion, CapabilityError>;
}
