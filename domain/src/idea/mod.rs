//! Idea domain
//!
//! - [`entities::Idea`]: one immutable, sequenced contribution
//! - [`log::IdeaLog`]: the append-only ledger that owns sequencing

pub mod entities;
pub mod log;
