//! Infrastructure layer for huddle
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading
//! and the JSONL session journal.

pub mod capabilities;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use capabilities::{
    ExtractiveSuggestionProvider, RegexActionItemExtractor, RegexSafetyScanner,
};
#[cfg(feature = "http-suggest")]
pub use capabilities::HttpSuggestionProvider;
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat};
pub use logging::JsonlSessionJournal;
