//! HTTP transport seam.
//!
//! The client talks to the backend through this narrow interface so tests
//! can script responses; the shipped implementation emulates the Android app
//! (fixed user agent, form-urlencoded POST bodies).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::StievieError;

/// User agent of the Android app the backend expects on every call.
pub(crate) const DEVICE_UA: &str =
    "Dalvik/1.6.0 (Linux; U; Android 4.4.4; Nexus 7 Build/KTU84P)";

/// Raw request execution. Implementations return response bodies trimmed of
/// surrounding whitespace; network-level failures surface as
/// [`StievieError::Transport`], distinct from application response codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: &str) -> Result<String, StievieError>;
    async fn get(&self, url: &str) -> Result<String, StievieError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(default_client())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: &str) -> Result<String, StievieError> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_owned())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?.trim().to_owned())
    }

    async fn get(&self, url: &str) -> Result<String, StievieError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;

        Ok(response.text().await?.trim().to_owned())
    }
}

/// HTTP client preconfigured with the device user agent.
pub fn default_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEVICE_UA));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to create http client")
}
