//! Pageloads HTTP Client
//!
//! Client for the endpoint that serves visit events:
//! `GET {base_url}{path}?start_date=..&end_date=..` returning a JSON array of
//! `{"timestamp": ...}` records.

use async_trait::async_trait;
use reqwest::Client;

use super::{EventSource, SourceError};
use crate::events::{DateRange, Event};

/// HTTP event source
pub struct PageloadsClient {
    client: Client,
    config: ClientConfig,
}

/// Configuration for the pageloads client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend (e.g., "http://localhost:3000")
    pub base_url: String,
    /// Endpoint path serving events
    pub path: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            path: "/pageloads".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl PageloadsClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full request URL for a range
    ///
    /// The boundaries are already encoded and go in untouched.
    pub fn url_for(&self, range: &DateRange) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = if self.config.path.starts_with('/') {
            self.config.path.clone()
        } else {
            format!("/{}", self.config.path)
        };
        format!("{}{}?{}", base, path, range.query_string())
    }
}

#[async_trait]
impl EventSource for PageloadsClient {
    fn name(&self) -> &str {
        "pageloads-http"
    }

    async fn fetch(&self, range: &DateRange) -> Result<Vec<Event>, SourceError> {
        let url = self.url_for(range);
        tracing::debug!(%url, "Fetching pageloads");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SourceError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response.text().await.map_err(SourceError::from_transport)?;
        decode_events(&body)
    }
}

/// Decode a response body; `null` or nothing at all means no events
pub(crate) fn decode_events(body: &str) -> Result<Vec<Event>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let events: Option<Vec<Event>> = serde_json::from_str(body)?;
    Ok(events.unwrap_or_default())
}
