use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} failed: {details}")]
    Request { url: String, details: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Fetches listing documents; abstracted so tests can count and fake requests
pub trait ListingTransport: Send + Sync {
    fn get_text(&self, url: &str) -> Result<String, TransportError>;
}

/// Blocking HTTP transport. The request timeout is the only ceiling; there is no retry.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ListingTransport for HttpTransport {
    fn get_text(&self, url: &str) -> Result<String, TransportError> {
        debug!(url, "Fetching version listing");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| TransportError::Request {
            url: url.to_string(),
            details: e.to_string(),
        })
    }
}
