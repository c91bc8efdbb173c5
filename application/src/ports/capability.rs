//! Errors shared by the external capability ports

use huddle_domain::SessionError;
use thiserror::Error;

/// Errors an external capability (suggestion, safety scan, extraction) can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Timeout")]
    Timeout,

    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl CapabilityError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CapabilityError::Timeout)
    }
}

impl From<CapabilityError> for SessionError {
    fn from(error: CapabilityError) -> Self {
        match error {
            CapabilityError::Timeout => SessionError::ExternalTimeout,
            other => SessionError::ExternalFailure(other.to_string()),
        }
    }
}
