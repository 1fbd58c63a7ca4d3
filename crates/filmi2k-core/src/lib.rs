//! Filmi2K Scraper Core Library
//!
//! Resolves playable streams for movies listed on filmi2k.com.
//!
//! # Overview
//!
//! The pipeline has four stages sharing one cache:
//! - Listing discovery: category pages and searches, via the site's REST
//!   API with a fallback to the rendered pages
//! - Identifier resolution: site titles mapped onto canonical ids of a
//!   Cinemeta-compatible metadata service
//! - Detail & embed extraction: player URLs found on a movie's page
//! - Embed deobfuscation: packed player scripts reversed and scanned for
//!   HLS playlists and MP4 files
//!
//! # Example
//!
//! ```no_run
//! use filmi2k_core::{Filmi2kScraper, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scraper = Filmi2kScraper::new()?;
//!
//!     // Newest releases, first page
//!     let entries = scraper.list_catalog("filmi2k-newest", 0).await;
//!
//!     for entry in &entries {
//!         println!("{}: {}", entry.canonical_id, entry.display_name);
//!     }
//!
//!     // Streams for the first entry
//!     if let Some(entry) = entries.first() {
//!         for stream in scraper.list_streams(&entry.canonical_id).await {
//!             println!("{} -> {:?}", stream.title, stream.media_url());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Direct media URLs
//!
//! Media hosts check `Referer` and `Origin`. A direct stream therefore
//! carries the headers the player has to send
//! ([`StreamDescriptor::required_headers`]). Media URLs usually expire
//! within hours; [`ScraperState`] only keeps them for the short cache tier.

mod cache;
pub mod catalog;
mod client;
pub mod config;
mod error;
pub mod metadata;
pub mod parser;
mod scraper;
mod types;
pub mod url;

// Re-export cache and state
pub use cache::{ScraperState, TtlCache, cache_key};

// Re-export client
pub use client::Filmi2kClient;

// Re-export configuration
pub use config::{ClientConfig, ScraperConfig, load_config, load_config_from_str};

// Re-export error types
pub use error::{Filmi2kError, Result};

// Re-export catalog lookups
pub use catalog::{Category, ListingFilter, categories, category_by_id};

// Re-export metadata client
pub use metadata::{MetaDetails, MetadataClient, select_candidate};

// Re-export main scraper API
pub use scraper::{
    DetailPage, Filmi2kScraper, LISTING_STRATEGIES, ListingQuery, ListingStrategy,
    SLUG_STRATEGIES, SlugStrategy,
};

// Re-export data types
pub use types::{
    CatalogEntry, MediaKind, MetaCandidate, RawListing, ResolvedMeta, STREAM_LABEL,
    StreamDescriptor, StreamSource,
};
