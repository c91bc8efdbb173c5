//! Offline suggestion provider
//!
//! Finds the terms that recur across the ideas of a context window and
//! proposes a synthesis citing the ideas that share them. Deterministic for
//! a given window, which makes it usable in simulations and tests.

use async_trait::async_trait;
use huddle_application::{CapabilityError, SuggestionProvider};
use huddle_domain::{ContextEntry, ContextWindow, IdeaId, Suggestion};
use std::collections::{BTreeMap, BTreeSet};

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "because", "been", "before", "being", "could", "does", "doing",
    "from", "have", "into", "just", "like", "maybe", "more", "most", "much", "only", "other",
    "over", "should", "some", "than", "that", "their", "them", "then", "there", "these",
    "they", "this", "those", "very", "what", "when", "where", "which", "while", "will",
    "with", "would", "your",
];

/// Suggestion provider that works from the window text alone.
#[derive(Debug, Clone)]
pub struct ExtractiveSuggestionProvider {
    max_citations: usize,
    max_terms: usize,
}

impl Default for ExtractiveSuggestionProvider {
    fn default() -> Self {
        Self {
            max_citations: 3,
            max_terms: 3,
        }
    }
}

struct WindowIdea<'a> {
    id: &'a IdeaId,
    sequence: u64,
    terms: BTreeSet<String>,
}

impl ExtractiveSuggestionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_citations(mut self, max: usize) -> Self {
        self.max_citations = max.max(1);
        self
    }

    fn terms(text: &str) -> BTreeSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 4)
            .map(str::to_lowercase)
            .filter(|w| !STOPWORDS.contains(&w.as_str()))
            .collect()
    }
}

#[async_trait]
impl SuggestionProvider for ExtractiveSuggestionProvider {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn suggest(&self, window: &ContextWindow) -> Result<Suggestion, CapabilityError> {
        let ideas: Vec<WindowIdea<'_>> = window
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ContextEntry::Idea {
                    idea_id,
                    sequence,
                    text,
                    ..
                } => Some(WindowIdea {
                    id: idea_id,
                    sequence: *sequence,
                    terms: Self::terms(text),
                }),
                ContextEntry::Assistant { .. } => None,
            })
            .collect();

        if ideas.is_empty() {
            return Ok(Suggestion::new(
                "No ideas yet. Try listing the constraints you already know about.",
                Vec::new(),
                0.1,
            ));
        }

        // Document frequency: a term counts once per idea
        let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for idea in &ideas {
            for term in &idea.terms {
                *frequency.entry(term.as_str()).or_default() += 1;
            }
        }
        let mut themes: Vec<(&str, usize)> =
            frequency.into_iter().filter(|(_, n)| *n > 1).collect();
        themes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        themes.truncate(self.max_terms);

        let mut ranked: Vec<(usize, &WindowIdea<'_>)> = ideas
            .iter()
            .map(|idea| {
                let score = themes
                    .iter()
                    .filter(|(term, _)| idea.terms.contains(*term))
                    .map(|(_, n)| n)
                    .sum();
                (score, idea)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.sequence.cmp(&a.1.sequence)));

        let cited: Vec<&WindowIdea<'_>> = ranked
            .into_iter()
            .take(self.max_citations)
            .map(|(_, idea)| idea)
            .collect();
        let labels = cited
            .iter()
            .map(|idea| format!("#{}", idea.sequence))
            .collect::<Vec<_>>()
            .join(", ");

        let text = if themes.is_empty() {
            format!("The latest ideas ({labels}) pull in different directions; pick one to explore further.")
        } else {
            let names = themes.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(", ");
            format!("Recurring themes: {names}. Ideas {labels} could be combined into one proposal.")
        };

        let shared = themes.first().map(|(_, n)| *n).unwrap_or(0);
        let confidence = 0.3 + 0.7 * (shared as f64 / ideas.len() as f64);

        Ok(Suggestion::new(
            text,
            cited.into_iter().map(|idea| idea.id.clone()).collect(),
            confidence,
        ))
    }
}
