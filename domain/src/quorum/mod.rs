//! Quorum domain: votes, rankings and consensus
//!
//! # Core Concepts
//!
//! ## Vote Ledger
//! One active vote per (voter, idea). Repeat votes are idempotent, or retract
//! the vote when toggling is enabled.
//!
//! ## Consensus Score
//! `leading idea votes / voting members`, always within `[0, 1]`.
//!
//! ## Headline Rule
//! A [`QuorumRule`] decides which ideas carried the room when the session is
//! summarized.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  vote / unvote ──► VoteLedger ──► rank_ideas ──► top_rated  │
//! │                                   │                          │
//! │                                   ├──► consensus_score       │
//! │                                   └──► select_headline       │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod consensus;
pub mod rule;
pub mod vote;

pub use consensus::{
    HeadlineBasis, RankedIdea, consensus_score, rank_ideas, select_headline, top_rated,
};
pub use rule::QuorumRule;
pub use vote::{Vote, VoteChange, VoteLedger, VoteTally};
