//! Transports that carry an encoded batch to the intake
//!
//! [`Transport`] is the seam between the shipper and the network: the
//! shipper only needs "send these bytes to this URL, tell me whether it
//! worked". [`HttpTransport`] is the production implementation.

use crate::core::{Result, ShipperError};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::OnceLock;
use std::time::Duration;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "DD-API-KEY";

/// A single batch POST.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub url: String,
    pub api_key: String,
    /// JSON array body
    pub body: Vec<u8>,
    /// Entries in `body`
    pub records: usize,
}

/// Sends encoded batches. Called from the delivery thread only.
pub trait Transport: Send + Sync {
    /// Perform exactly one attempt; `Err` on network failure or a
    /// non-success response.
    fn send(&self, request: DeliveryRequest) -> Result<()>;
    fn name(&self) -> &str;
}

/// HTTP transport over a blocking reqwest client
///
/// The client is built on first use, on the delivery thread, so creating a
/// shipper from inside an async runtime is safe.
pub struct HttpTransport {
    timeout: Option<Duration>,
    client: OnceLock<Client>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            timeout: None,
            client: OnceLock::new(),
        }
    }

    /// Bound every request by `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: DeliveryRequest) -> Result<()> {
        let response = self
            .client()?
            .post(&request.url)
            .header(API_KEY_HEADER, &request.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(ShipperError::http_status(status.as_u16(), body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
