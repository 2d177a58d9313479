//! Subcommand handlers. Each returns the JSON value printed by `main`.

use crate::CacheAction;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use gallery_core::models::content_type_for;
use gallery_core::{CachedGallery, FilePayload, GalleryApi, ImageFilters, UploadRequest};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

/// Parse an RFC 3339 timestamp, or a bare date taken as midnight UTC.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}': expected RFC 3339 or YYYY-MM-DD", input))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date '{}'", input))?;
    Ok(midnight.and_utc())
}

pub fn build_filters(
    categories: Vec<String>,
    tags: Vec<String>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<ImageFilters> {
    let start_date = start.map(parse_date).transpose()?;
    let end_date = end.map(parse_date).transpose()?;
    if let (Some(s), Some(e)) = (&start_date, &end_date) {
        if s > e {
            bail!("--start must not be after --end");
        }
    }

    Ok(ImageFilters {
        categories,
        tags,
        start_date,
        end_date,
    })
}

pub async fn list<A: GalleryApi>(
    gallery: &CachedGallery<A>,
    filters: &ImageFilters,
    no_cache: bool,
) -> Result<Value> {
    let (images, cached) = if no_cache {
        (gallery.refresh_images(filters).await?, false)
    } else {
        let listing = gallery.list_images(filters).await?;
        let cached = listing.is_cached();
        (listing.images, cached)
    };

    info!(
        "{} images ({})",
        images.len(),
        if cached { "cache" } else { "network" }
    );
    Ok(json!({ "cached": cached, "count": images.len(), "images": images }))
}

pub async fn show<A: GalleryApi>(gallery: &CachedGallery<A>, id: &str) -> Result<Value> {
    let image = gallery.refresh_image(id).await?;
    Ok(serde_json::to_value(image)?)
}

pub async fn upload<A: GalleryApi>(
    gallery: &CachedGallery<A>,
    path: &Path,
    title: String,
    category: String,
    tags: Vec<String>,
) -> Result<Value> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Upload path has no file name")?;

    let request = UploadRequest {
        title,
        category,
        tags,
        file: FilePayload::from_bytes(name, content_type_for(path), &bytes),
    };
    let image = gallery.upload_image(&request).await?;
    Ok(serde_json::to_value(image)?)
}

pub async fn delete<A: GalleryApi>(gallery: &CachedGallery<A>, id: &str) -> Result<Value> {
    gallery.delete_image(id).await?;
    Ok(json!({ "deleted": id }))
}

pub fn cache<A: GalleryApi>(gallery: &CachedGallery<A>, action: CacheAction) -> Result<Value> {
    match action {
        CacheAction::Stats => {
            let stats = gallery.cache_stats();
            let mut value = serde_json::to_value(&stats)?;
            value["total_entries"] = json!(stats.total_entries());
            Ok(value)
        }
        CacheAction::Clear => {
            gallery.clear_cache()?;
            Ok(json!({ "cleared": true }))
        }
        CacheAction::Purge => {
            let purged = gallery.purge_expired()?;
            Ok(json!({ "purged": purged }))
        }
    }
}
