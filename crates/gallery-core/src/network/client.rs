//! Thin HTTP wrapper around reqwest.
//!
//! Adds a default timeout and user agent, and maps transport failures to
//! [`GalleryError`]. Status handling is left to the caller.

use crate::config::NetworkConfig;
use crate::{GalleryError, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client with a fixed default timeout.
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| GalleryError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// GET with query-string pairs.
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        self.send("GET", url, self.client.get(url).query(query), self.default_timeout)
            .await
    }

    /// POST a JSON body, optionally with a longer timeout than the default.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let request = self.client.post(url).timeout(timeout).json(body);
        self.send("POST", url, request, timeout).await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.send("DELETE", url, self.client.delete(url), self.default_timeout)
            .await
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response> {
        debug!("{} {}", method, url);
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GalleryError::Timeout(timeout)
            } else {
                GalleryError::Network {
                    message: format!("{} {} failed: {}", method, extract_domain(url), e),
                    source: Some(e),
                }
            }
        })?;
        debug!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }
}

/// Extract the host from a URL for log and error messages.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
