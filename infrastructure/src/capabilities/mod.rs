//! Capability adapters
//!
//! Offline implementations of the application's capability ports, plus an
//! HTTP suggestion client behind the `http-suggest` feature.

mod action_items;
mod extractive;
#[cfg(feature = "http-suggest")]
mod http;
mod safety;

pub use action_items::RegexActionItemExtractor;
pub use extractive::ExtractiveSuggestionProvider;
#[cfg(feature = "http-suggest")]
pub use http::HttpSuggestionProvider;
pub use safety::RegexSafetyScanner;
