//! Pattern-based safety scanner
//!
//! Flags personal data (emails, phone numbers, card-like digit runs) and a
//! configurable list of blocked terms. Card numbers and blocked terms mark
//! the text for review; contact details are flagged only.

use async_trait::async_trait;
use huddle_application::{CapabilityError, SafetyScanner, SafetyVerdict};
use regex::{Regex, RegexBuilder};

struct Rule {
    flag: String,
    pattern: Regex,
    requires_review: bool,
}

/// Safety scanner built from regular expressions.
pub struct RegexSafetyScanner {
    rules: Vec<Rule>,
}

impl RegexSafetyScanner {
    /// Scanner with the built-in personal-data rules.
    pub fn new() -> Result<Self, regex::Error> {
        let builtin = [
            ("pii:email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}", false),
            ("pii:phone", r"\+?\d[\d\s().-]{8,}\d", false),
            ("pii:card", r"\b(?:\d[ -]?){13,16}\b", true),
        ];
        let rules = builtin
            .into_iter()
            .map(|(flag, pattern, requires_review)| {
                Ok(Rule {
                    flag: flag.to_string(),
                    pattern: Regex::new(pattern)?,
                    requires_review,
                })
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Add whole-word, case-insensitive blocked terms.
    pub fn with_blocked_terms<I, S>(mut self, terms: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
                .case_insensitive(true)
                .build()?;
            self.rules.push(Rule {
                flag: format!("blocked_term:{}", term.to_lowercase()),
                pattern,
                requires_review: true,
            });
        }
        Ok(self)
    }
}

#[async_trait]
impl SafetyScanner for RegexSafetyScanner {
    async fn scan(&self, text: &str) -> Result<SafetyVerdict, CapabilityError> {
        let mut verdict = SafetyVerdict::default();
        for rule in &self.rules {
            if rule.pattern.is_match(text) {
                verdict.flags.push(rule.flag.clone());
                verdict.requires_review |= rule.requires_review;
            }
        }
        Ok(verdict)
    }
}
