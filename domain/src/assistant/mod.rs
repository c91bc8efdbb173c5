//! Assistant domain
//!
//! - [`context::ContextWindow`]: the bounded slice of the session an
//!   invocation is grounded on
//! - [`contribution::AssistantContribution`]: a published suggestion, with
//!   its citations and the window that produced it
//! - [`trigger::TriggerState`]: automatic triggering and backpressure

pub mod context;
pub mod contribution;
pub mod trigger;
