//! Collaborative session aggregate.
//!
//! - [`entities::Session`]: roster, idea log, votes and assistant output of one run
//! - [`status::SessionStatus`]: the `forming → active → ending → ended` lifecycle
//! - [`event::SessionEvent`]: what gets broadcast after each mutation
//! - [`snapshot::SessionSnapshot`]: catch-up view for reconnecting clients

pub mod entities;
pub mod event;
pub mod snapshot;
pub mod status;
