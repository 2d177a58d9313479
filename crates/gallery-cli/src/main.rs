//! Gallery CLI - command-line client for the image gallery.
//!
//! Wraps the gallery-core library: listings go through the persistent query
//! cache, mutations invalidate it. Results are printed to stdout as JSON;
//! logs go to stderr.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gallery_core::{ClientConfig, GalleryBuilder, NetworkConfig, PathsConfig, StoreKind};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gallery-cli")]
#[command(about = "Command-line client for the image gallery")]
struct Args {
    /// Base URL of the gallery API
    #[arg(long, env = "GALLERY_API_URL", default_value = NetworkConfig::DEFAULT_API_URL)]
    api_url: String,

    /// Directory holding the query cache (defaults to the user cache dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Durable store backend for the query cache: json, sqlite or memory
    #[arg(long, default_value = "json")]
    store: StoreKind,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List images, served from cache when fresh
    List {
        /// Filter by category (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Filter by tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Earliest upload date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Latest upload date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Bypass the cache and refetch
        #[arg(long)]
        no_cache: bool,
    },

    /// Re-read one image and patch it into cached listings
    Show { id: String },

    /// Upload an image file
    Upload {
        path: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        category: String,

        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Delete an image
    Delete { id: String },

    /// Inspect or maintain the query cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Entry counts by partition and freshness
    Stats,
    /// Drop every cached listing
    Clear,
    /// Remove stale entries
    Purge,
}

fn default_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join(PathsConfig::CACHE_DIR_NAME))
        .context("Could not determine a cache directory; pass --cache-dir")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut builder = GalleryBuilder::new()
        .client_config(ClientConfig::new(&args.api_url))
        .store_kind(args.store);
    if args.store != StoreKind::Memory {
        let cache_dir = match args.cache_dir {
            Some(dir) => dir,
            None => default_cache_dir()?,
        };
        debug!("Cache directory: {}", cache_dir.display());
        builder = builder.cache_dir(cache_dir);
    }
    let gallery = builder.build()?;

    let output = match args.command {
        Command::List {
            categories,
            tags,
            start,
            end,
            no_cache,
        } => {
            let filters = commands::build_filters(categories, tags, start.as_deref(), end.as_deref())?;
            commands::list(&gallery, &filters, no_cache).await?
        }
        Command::Show { id } => commands::show(&gallery, &id).await?,
        Command::Upload {
            path,
            title,
            category,
            tags,
        } => commands::upload(&gallery, &path, title, category, tags).await?,
        Command::Delete { id } => commands::delete(&gallery, &id).await?,
        Command::Cache { action } => commands::cache(&gallery, action)?,
    };

    // Result goes to stdout for piping
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
