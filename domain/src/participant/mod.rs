//! Participant domain
//!
//! - [`entities::Participant`]: one human attached to a session
//! - [`roster::Roster`]: seat cap, heartbeats and reconnection rules

pub mod entities;
pub mod roster;
