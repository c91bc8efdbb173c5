//! Consensus rules for headline selection
//!
//! A rule decides whether an idea's vote count carries the room, given the
//! number of voting members.

use serde::{Deserialize, Serialize};

/// Rule for deciding whether an idea has consensus
///
/// - `Majority`: strictly more than half of the members (default)
/// - `Percentage(p)`: at least p% of the members
/// - `AtLeast(n)`: at least n votes, regardless of room size
///
/// # Example
///
/// ```
/// use huddle_domain::quorum::QuorumRule;
///
/// let rule = QuorumRule::Majority;
/// assert!(rule.is_satisfied(3, 4));  // 3/4 > 50%
/// assert!(!rule.is_satisfied(2, 4)); // exactly half is not enough
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    #[default]
    Majority,
    Percentage(u8),
    AtLeast(usize),
}

impl QuorumRule {
    pub fn is_satisfied(&self, votes: usize, members: usize) -> bool {
        if members == 0 || votes == 0 {
            return false;
        }
        votes >= self.min_votes_needed(members)
    }

    pub fn min_votes_needed(&self, members: usize) -> usize {
        match self {
            QuorumRule::Majority => members / 2 + 1,
            QuorumRule::Percentage(p) => {
                ((members as f64) * (*p as f64 / 100.0)).ceil() as usize
            }
            QuorumRule::AtLeast(n) => *n,
        }
    }

    pub fn description(&self) -> String {
        match self {
            QuorumRule::Majority => "more than half of the room".to_string(),
            QuorumRule::Percentage(p) => format!("at least {p}% of the room"),
            QuorumRule::AtLeast(n) => format!("at least {n} votes"),
        }
    }
}

impl std::fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::str::FromStr for QuorumRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "majority" {
            return Ok(QuorumRule::Majority);
        }
        if let Some(value) = s.strip_prefix("at_least:").or_else(|| s.strip_prefix("atleast:")) {
            return value
                .parse()
                .map(QuorumRule::AtLeast)
                .map_err(|_| format!("invalid vote count: {value}"));
        }
        if let Some(value) = s.strip_suffix('%') {
            let p: u8 = value
                .parse()
                .map_err(|_| format!("invalid percentage: {value}"))?;
            if p > 100 {
                return Err(format!("percentage out of range: {p}"));
            }
            return Ok(QuorumRule::Percentage(p));
        }
        Err(format!(
            "unknown rule '{s}' (expected majority, at_least:N or N%)"
        ))
    }
}
