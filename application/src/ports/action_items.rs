//! Action-item extraction port
//!
//! Called once per summary with the full idea log.

use super::capability::CapabilityError;
use async_trait::async_trait;
use huddle_domain::{ActionItem, Idea};

#[async_trait]
pub trait ActionItemExtractor: Send + Sync {
    async fn extract(&self, ideas: &[Idea]) -> Result<Vec<ActionItem>, CapabilityError>;
}

/// Extractor that finds nothing
pub struct NoActionItems;

#[async_trait]
impl ActionItemExtractor for NoActionItems {
    async fn extract(&self, _ideas: &[Idea]) -> Result<Vec<ActionItem>, CapabilityError> {
        Ok(Vec::new())
    }
}
