//! Session summarizer use case
//!
//! Ending a session is a three-step affair: move to `ending` so nothing new
//! is accepted, extract action items outside the lock, then compile and
//! attach the summary while moving to `ended`. Every step tolerates being
//! repeated, so ending twice returns the same summary.

use super::handle::SessionHandle;
use crate::config::EngineConfig;
use crate::ports::action_items::ActionItemExtractor;
use crate::ports::clock::Clock;
use huddle_domain::{
    ActionItem, Applied, Idea, SessionError, SessionStatus, SessionSummary, compile_summary,
};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SessionSummarizer {
    extractor: Arc<dyn ActionItemExtractor>,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
}

impl SessionSummarizer {
    pub fn new(
        extractor: Arc<dyn ActionItemExtractor>,
        clock: Arc<dyn Clock>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            extractor,
            clock,
            config,
        }
    }

    /// End the session and return its summary.
    pub async fn end(&self, handle: &SessionHandle) -> Result<SessionSummary, SessionError> {
        if let Some(summary) = handle.read().await.summary() {
            return Ok(summary.clone());
        }

        let now = self.clock.now();
        handle
            .mutate("end", |s| {
                if s.status().is_terminal() {
                    Ok(Applied {
                        value: false,
                        events: Vec::new(),
                    })
                } else {
                    s.transition(SessionStatus::Ending, now)
                }
            })
            .await?;

        // The log is frozen from here on.
        let ideas = handle.read().await.ideas().all().to_vec();
        let (action_items, degraded) = self.extract(handle, &ideas).await;

        let policy = self.config.summary_policy();
        let now = self.clock.now();
        let summary = handle
            .mutate("finalize", |s| {
                let summary = compile_summary(s, action_items, degraded, &policy)?;
                s.finalize(summary, now)
            })
            .await?;

        info!(
            session_id = %handle.id(),
            ideas = summary.total_ideas,
            votes = summary.total_votes,
            consensus = summary.consensus_score,
            "Session ended"
        );
        Ok(summary)
    }

    async fn extract(
        &self,
        handle: &SessionHandle,
        ideas: &[Idea],
    ) -> (Vec<ActionItem>, bool) {
        match timeout(self.config.extraction_timeout, self.extractor.extract(ideas)).await {
            Ok(Ok(items)) => (items, false),
            Ok(Err(e)) => {
                warn!(session_id = %handle.id(), "Action-item extraction failed: {}", e);
                (Vec::new(), true)
            }
            Err(_) => {
                warn!(session_id = %handle.id(), "Action-item extraction timed out");
                (Vec::new(), true)
            }
        }
    }
}
