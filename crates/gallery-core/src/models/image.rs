//! Image records and upload payloads.

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// An image record as returned by the gallery API.
///
/// `id` is assigned by the document store on creation and never changes; it
/// is the only identity used when patching cached query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub url: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

/// Accepts the three shapes `uploadedAt` takes on the wire: an RFC 3339
/// string (fresh uploads), a Firestore `{_seconds, _nanoseconds}` object
/// (documents read back from the store), or epoch milliseconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Text(String),
        Firestore {
            #[serde(rename = "_seconds", alias = "seconds")]
            seconds: i64,
            #[serde(rename = "_nanoseconds", alias = "nanoseconds", default)]
            nanos: u32,
        },
        Millis(i64),
    }

    match Wire::deserialize(deserializer)? {
        Wire::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        Wire::Firestore { seconds, nanos } => Utc
            .timestamp_opt(seconds, nanos)
            .single()
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
        Wire::Millis(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
    }
}

/// File portion of an upload request. `data` is base64 without a data-URL prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub data: String,
}

impl FilePayload {
    /// Encode raw bytes for the upload endpoint.
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Size of the decoded file in bytes.
    pub fn decoded_len(&self) -> usize {
        // 4 base64 chars carry 3 bytes, minus padding
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding)
    }
}

/// Guess an image MIME type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Body of `POST /images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub file: FilePayload,
}
