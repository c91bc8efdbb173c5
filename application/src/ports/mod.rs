//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod action_items;
pub mod capability;
pub mod clock;
pub mod safety_scanner;
pub mod session_journal;
pub mod suggestion;
