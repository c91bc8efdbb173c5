//! Session summary domain
//!
//! - [`entities::SessionSummary`]: the terminal artifact of a session
//! - [`compile::compile_summary`]: deterministic compilation from final state

pub mod compile;
pub mod entities;
