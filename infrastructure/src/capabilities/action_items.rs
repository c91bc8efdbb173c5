//! Rule-based action-item extraction
//!
//! An idea yields an action item when it carries an explicit marker
//! (`TODO:`, `Action:`, `AI:`) or starts with a commitment phrase such as
//! "we should" or "let's". An `@handle` in the text names the owner.

use async_trait::async_trait;
use huddle_application::{ActionItemExtractor, CapabilityError};
use huddle_domain::{ActionItem, Idea, ParticipantId};
use regex::{Regex, RegexBuilder};

pub struct RegexActionItemExtractor {
    marker: Regex,
    commitment: Regex,
    owner: Regex,
}

impl RegexActionItemExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            marker: RegexBuilder::new(r"^\s*(?:todo|action|ai)\s*:\s*(?P<rest>.+)$")
                .case_insensitive(true)
                .build()?,
            commitment: RegexBuilder::new(
                r"^\s*(?:we\s+(?:should|must|need\s+to|will)|let'?s|i\s+will|i'll)\s+(?P<rest>.+)$",
            )
            .case_insensitive(true)
            .build()?,
            owner: Regex::new(r"@(?P<handle>[A-Za-z0-9_.-]+)")?,
        })
    }

    fn extract_one(&self, idea: &Idea) -> Option<ActionItem> {
        let line = idea.text.lines().find(|l| !l.trim().is_empty())?;
        let captures = self
            .marker
            .captures(line)
            .or_else(|| self.commitment.captures(line))?;
        let rest = captures.name("rest")?.as_str().trim();
        if rest.is_empty() {
            return None;
        }

        let owner = self
            .owner
            .captures(&idea.text)
            .and_then(|c| c.name("handle"))
            .map(|m| ParticipantId::new(m.as_str()));

        Some(ActionItem {
            text: rest.trim_end_matches('.').to_string(),
            source_idea: Some(idea.id.clone()),
            owner,
        })
    }
}

#[async_trait]
impl ActionItemExtractor for RegexActionItemExtractor {
    async fn extract(&self, ideas: &[Idea]) -> Result<Vec<ActionItem>, CapabilityError> {
        Ok(ideas.iter().filter_map(|idea| self.extract_one(idea)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use huddle_domain::IdeaLog;

    fn ideas(texts: &[&str]) -> Vec<Idea> {
        let mut log = IdeaLog::new();
        for text in texts {
            log.append(ParticipantId::new("p"), text, None, Utc::now())
                .unwrap();
        }
        log.all().to_vec()
    }

    #[tokio::test]
    async fn test_markers_and_commitments() {
        let ideas = ideas(&[
            "TODO: draft the launch email @maria",
            "The dashboard is slow",
            "We should add an index on created_at.",
            "let's timebox the spike to two days",
        ]);
        let items = RegexActionItemExtractor::new()
            .unwrap()
            .extract(&ideas)
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text, "draft the launch email @maria");
        assert_eq!(items[0].owner, Some(ParticipantId::new("maria")));
        assert_eq!(items[0].source_idea.as_ref(), Some(&ideas[0].id));
        assert_eq!(items[1].text, "add an index on created_at");
        assert_eq!(items[1].owner, None);
        assert_eq!(items[2].text, "timebox the spike to two days");
    }

    #[tokio::test]
    async fn test_no_items() {
        let ideas = ideas(&["Ideas without commitments", "todo"]);
        let items = RegexActionItemExtractor::new()
            .unwrap()
            .extract(&ideas)
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
