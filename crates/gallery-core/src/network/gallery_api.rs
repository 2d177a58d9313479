//! REST client for the gallery API (`/images` routes).

use super::client::HttpClient;
use super::retry::{retry_async, RetryConfig};
use super::traits::{GalleryApi, ImageFetcher};
use crate::config::{ClientConfig, NetworkConfig};
use crate::models::{ApiEnvelope, Image, ImageFilters, ResponseCode, UploadRequest};
use crate::{GalleryError, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

/// HTTP implementation of [`GalleryApi`].
pub struct GalleryApiClient {
    http: HttpClient,
    images_url: Url,
    retry: RetryConfig,
}

impl GalleryApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let images_url = images_url(&config.base_url)?;
        Ok(Self {
            http: HttpClient::with_timeout(config.timeout)?,
            retry: RetryConfig::from_client_config(&config),
            images_url,
        })
    }

    /// Replace the retry policy used for reads.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn images_url(&self) -> &Url {
        &self.images_url
    }

    /// `<base>/images/<id>`, with the id percent-encoded as one path segment.
    pub fn image_url(&self, id: &str) -> Result<Url> {
        let mut url = self.images_url.clone();
        url.path_segments_mut()
            .map_err(|_| GalleryError::Config {
                message: format!("API URL cannot take path segments: {}", self.images_url),
            })?
            .push(id);
        Ok(url)
    }

    async fn list_once(&self, filters: &ImageFilters) -> Result<Vec<Image>> {
        let response = self
            .http
            .get(self.images_url.as_str(), &filters.to_query_pairs())
            .await?;
        let images: Option<Vec<Image>> = decode_envelope(response).await?;
        Ok(images.unwrap_or_default())
    }

    async fn get_once(&self, id: &str) -> Result<Image> {
        let url = self.image_url(id)?;
        let response = self.http.get(url.as_str(), &[]).await?;
        decode_envelope::<Image>(response)
            .await
            .map_err(|e| not_found_as(e, id))?
            .ok_or_else(|| GalleryError::ImageNotFound { id: id.to_string() })
    }
}

#[async_trait]
impl ImageFetcher for GalleryApiClient {
    async fn fetch_images(&self, filters: &ImageFilters) -> Result<Vec<Image>> {
        let (result, stats) =
            retry_async(&self.retry, "list images", || self.list_once(filters)).await;
        if let Ok(images) = &result {
            debug!(
                "Fetched {} images in {} attempt(s)",
                images.len(),
                stats.attempts
            );
        }
        result
    }
}

#[async_trait]
impl GalleryApi for GalleryApiClient {
    async fn fetch_image(&self, id: &str) -> Result<Image> {
        let (result, _) = retry_async(&self.retry, "get image", || self.get_once(id)).await;
        result
    }

    async fn upload_image(&self, request: &UploadRequest) -> Result<Image> {
        info!(
            "Uploading {} ({} bytes) as \"{}\"",
            request.file.name,
            request.file.decoded_len(),
            request.title
        );
        let response = self
            .http
            .post_json(
                self.images_url.as_str(),
                request,
                Some(NetworkConfig::UPLOAD_TIMEOUT),
            )
            .await?;

        decode_envelope::<Image>(response)
            .await?
            .ok_or_else(|| GalleryError::Other("Upload response carried no image".to_string()))
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        let url = self.image_url(id)?;
        let response = self.http.delete(url.as_str()).await?;
        decode_envelope::<serde_json::Value>(response)
            .await
            .map_err(|e| not_found_as(e, id))?;
        info!("Deleted image {}", id);
        Ok(())
    }
}

/// Join `/images` onto the configured API base.
fn images_url(base_url: &str) -> Result<Url> {
    let joined = format!("{}/images", base_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| GalleryError::Config {
        message: format!("Invalid API URL {}: {}", base_url, e),
    })
}

/// Read a `{code, status, data}` envelope, mapping failures to errors.
async fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let status = response.status();
    let body = response.text().await?;
    parse_envelope(status, &body)
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Option<T>> {
    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) if envelope.is_success() && !status.is_success() => Err(GalleryError::Api {
            code: format!("HTTP_{}", status.as_u16()),
            status: envelope.status,
            http_status: status.as_u16(),
        }),
        Ok(envelope) => envelope.into_data(status.as_u16()),
        // Non-envelope bodies come from gateways and proxies, not the API
        Err(_) if !status.is_success() => Err(GalleryError::Api {
            code: format!("HTTP_{}", status.as_u16()),
            status: status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
            http_status: status.as_u16(),
        }),
        Err(e) => Err(GalleryError::Json {
            message: format!("Malformed API response: {}", e),
            source: Some(e),
        }),
    }
}

fn not_found_as(err: GalleryError, id: &str) -> GalleryError {
    match err {
        GalleryError::Api { ref code, http_status, .. }
            if http_status == 404 || code == ResponseCode::NotFound.as_str() =>
        {
            GalleryError::ImageNotFound { id: id.to_string() }
        }
        other => other,
    }
}
