//! Event Sources
//!
//! Where pageload events come from. The view only talks to the
//! [`EventSource`] trait; [`PageloadsClient`] is the HTTP implementation.

mod client;

pub use client::{ClientConfig, PageloadsClient};

use async_trait::async_trait;
use thiserror::Error;

use crate::events::{DateRange, Event};

/// Anything that can hand back the events recorded in a date range
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch every event in `range`
    ///
    /// An empty vector means the source answered but had nothing usable.
    async fn fetch(&self, range: &DateRange) -> Result<Vec<Event>, SourceError>;
}

/// Errors that can occur while retrieving events
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Event source unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to decode events: {0}")]
    Decode(String),
}

impl SourceError {
    /// Classify a transport error
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Unavailable
        } else {
            SourceError::Request(err)
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::ApiError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error 502: bad gateway");
        assert_eq!(SourceError::Timeout.to_string(), "Request timeout");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<Event>>("{").unwrap_err();
        let err: SourceError = json_err.into();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
