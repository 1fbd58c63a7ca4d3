//! Debug script to list a catalog page and run a search against the live site
//!
//! Run with: cargo run --example debug_catalog -p filmi2k-core -- [category] [query]
//! Log verbosity follows RUST_LOG (e.g. RUST_LOG=filmi2k_core=debug).

use filmi2k_core::{Filmi2kScraper, categories};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("filmi2k_core=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let category = args.next().unwrap_or_else(|| "filmi2k-newest".to_string());
    let query = args.next();

    println!("Known categories:");
    for c in categories() {
        println!("  {:<24} {}", c.id, c.name);
    }
    println!();

    let scraper = Filmi2kScraper::new()?;

    println!("Listing '{}'...\n", category);
    let entries = scraper.list_catalog(&category, 0).await;
    if entries.is_empty() {
        println!("No entries found!");
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{}. {}", i + 1, entry.display_name);
        println!("   ID: {}", entry.canonical_id);
        if !entry.poster_url.is_empty() {
            println!("   Poster: {}", entry.poster_url);
        }
    }

    if let Some(query) = query {
        println!("\nSearching for '{}'...\n", query);
        let results = scraper.search(&query).await;
        println!("Found {} results", results.len());
        for entry in &results {
            println!("  {} -> {}", entry.display_name, entry.canonical_id);
        }
    }

    Ok(())
}
