//! Error types for the gallery client.
//!
//! Every fallible operation in this crate returns [`GalleryError`]. Cache
//! misses and forced misses are not errors; they are represented as `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the gallery library.
#[derive(Debug, Error)]
pub enum GalleryError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// The API answered but reported a failure in its response envelope.
    #[error("API error {code} (HTTP {http_status}): {status}")]
    Api {
        code: String,
        status: String,
        http_status: u16,
    },

    #[error("Image not found: {id}")]
    ImageNotFound { id: String },

    // Durable storage errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for gallery operations.
pub type Result<T> = std::result::Result<T, GalleryError>;

impl From<std::io::Error> for GalleryError {
    fn from(err: std::io::Error) -> Self {
        GalleryError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        GalleryError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for GalleryError {
    fn from(err: rusqlite::Error) -> Self {
        GalleryError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// The request timeout is unknown here; `HttpClient` maps timeouts with the
// configured duration before this conversion is reached.
impl From<reqwest::Error> for GalleryError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        GalleryError::Network {
            message,
            source: Some(err),
        }
    }
}

impl GalleryError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        GalleryError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GalleryError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Server-side failures (5xx), throttling and request timeouts are
    /// retried; other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GalleryError::Network { .. } | GalleryError::Timeout(_) => true,
            GalleryError::Api { http_status, .. } => {
                *http_status >= 500 || matches!(http_status, 408 | 429)
            }
            _ => false,
        }
    }

    /// Check if this error came from the durable cache store.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            GalleryError::Database { .. } | GalleryError::Io { .. } | GalleryError::Json { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GalleryError::ImageNotFound { id: "a1".into() };
        assert_eq!(err.to_string(), "Image not found: a1");

        let err = GalleryError::Api {
            code: "ERROR".into(),
            status: "Failed to retrieve images".into(),
            http_status: 500,
        };
        assert_eq!(
            err.to_string(),
            "API error ERROR (HTTP 500): Failed to retrieve images"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(GalleryError::Timeout(std::time::Duration::from_secs(5)).is_retryable());
        assert!(GalleryError::Api {
            code: "ERROR".into(),
            status: "boom".into(),
            http_status: 503,
        }
        .is_retryable());
        assert!(!GalleryError::Api {
            code: "NOT_FOUND".into(),
            status: "Image not found".into(),
            http_status: 404,
        }
        .is_retryable());
        assert!(!GalleryError::ImageNotFound { id: "x".into() }.is_retryable());

        for http_status in [408, 429, 501, 599] {
            let err = GalleryError::Api {
                code: format!("HTTP_{}", http_status),
                status: "gateway".into(),
                http_status,
            };
            assert!(err.is_retryable(), "{} should be retried", http_status);
        }
    }

    #[test]
    fn test_reqwest_error_becomes_network() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = GalleryError::from(err);
        assert!(matches!(err, GalleryError::Network { source: Some(_), .. }));
        assert!(err.is_retryable());
        assert!(!err.to_string().contains("0ns"));
    }

    #[test]
    fn test_storage_classification() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(GalleryError::io_with_path(io, "/tmp/cache.json").is_storage());
        assert!(!GalleryError::validation("ttl", "must be positive").is_storage());
    }
}
