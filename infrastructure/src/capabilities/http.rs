//! Remote suggestion provider
//!
//! POSTs the context window as JSON to an HTTP endpoint and expects a
//! [`Suggestion`] object back (`text`, `referenced_ideas`, `confidence`).

use async_trait::async_trait;
use huddle_application::{CapabilityError, SuggestionProvider};
use huddle_domain::{ContextWindow, Suggestion};
use std::time::Duration;
use tracing::debug;

pub struct HttpSuggestionProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSuggestionProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("huddle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CapabilityError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SuggestionProvider for HttpSuggestionProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn suggest(&self, window: &ContextWindow) -> Result<Suggestion, CapabilityError> {
        debug!(
            endpoint = %self.endpoint,
            session_id = %window.session_id,
            entries = window.entries.len(),
            "Requesting remote suggestion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(window)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CapabilityError::Timeout
                } else {
                    CapabilityError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Unavailable(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let suggestion: Suggestion = response
            .json()
            .await
            .map_err(|e| CapabilityError::InvalidResponse(e.to_string()))?;

        if suggestion.text.trim().is_empty() {
            return Err(CapabilityError::InvalidResponse(
                "empty suggestion text".to_string(),
            ));
        }

        Ok(Suggestion::new(
            suggestion.text,
            suggestion.referenced_ideas,
            suggestion.confidence,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_endpoint() {
        let provider =
            HttpSuggestionProvider::new("http://localhost:9/suggest", Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9/suggest");
        assert_eq!(provider.name(), "http");
    }
}
