//! Network access to the gallery API.
//!
//! This module provides:
//! - A reqwest wrapper with timeouts and error mapping
//! - Retry with exponential backoff and jitter
//! - The `/images` REST client
//! - The [`ImageFetcher`] and [`GalleryApi`] traits the cache layer consumes

mod client;
mod gallery_api;
mod retry;
mod traits;

pub use client::{extract_domain, HttpClient};
pub use gallery_api::GalleryApiClient;
pub use retry::{retry_async, RetryConfig, RetryStats};
pub use traits::{GalleryApi, ImageFetcher};
