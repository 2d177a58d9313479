//! Cached listing example - list a category twice and show where it came from

use gallery_core::{ClientConfig, GalleryBuilder, ImageFilters, NetworkConfig, Result, StoreKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Get category from args or list everything
    let filters = std::env::args()
        .nth(1)
        .map(ImageFilters::category)
        .unwrap_or_default();
    let api_url = std::env::var("GALLERY_API_URL")
        .unwrap_or_else(|_| NetworkConfig::DEFAULT_API_URL.to_string());

    let gallery = GalleryBuilder::new()
        .client_config(ClientConfig::new(api_url))
        .store_kind(StoreKind::Memory)
        .build()?;

    for _ in 0..2 {
        let listing = gallery.list_images(&filters).await?;
        println!("{} images from {:?}", listing.images.len(), listing.source);
    }

    let stats = gallery.cache_stats();
    println!("Cache holds {} entries", stats.total_entries());

    Ok(())
}
