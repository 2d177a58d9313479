//! Response envelope used by every gallery API route.
//!
//! The server wraps payloads as `{ code, status, data }`, where `code` is
//! `SUCCESS`, `NOT_FOUND` or `ERROR` and `status` is a human-readable message.

use crate::{GalleryError, Result};
use serde::{Deserialize, Serialize};

/// Outcome code carried in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Success,
    NotFound,
    Error,
    #[serde(other)]
    Unknown,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::Success => "SUCCESS",
            ResponseCode::NotFound => "NOT_FOUND",
            ResponseCode::Error => "ERROR",
            ResponseCode::Unknown => "UNKNOWN",
        }
    }
}

/// Generic API response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: ResponseCode,
    pub status: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Success
    }

    /// Unwrap the payload, mapping failure codes to errors.
    ///
    /// `http_status` is recorded on [`GalleryError::Api`] so callers can tell
    /// server faults from client faults.
    pub fn into_data(self, http_status: u16) -> Result<Option<T>> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(GalleryError::Api {
                code: self.code.as_str().to_string(),
                status: self.status,
                http_status,
            })
        }
    }
}
