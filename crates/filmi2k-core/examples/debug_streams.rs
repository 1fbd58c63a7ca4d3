//! Debug script to resolve streams for a canonical id against the live site
//!
//! Run with: cargo run --example debug_streams -p filmi2k-core -- tt1375666
//! Pass a config file as second argument to override defaults (relay, timeouts).

use std::path::Path;

use filmi2k_core::{Filmi2kScraper, ScraperConfig, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("filmi2k_core=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let id = args.next().unwrap_or_else(|| "tt1375666".to_string());
    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => ScraperConfig::default(),
    };

    let scraper = Filmi2kScraper::with_config(config)?;

    println!("Embed candidates for {}:", id);
    let embeds = scraper.embed_candidates(&id).await;
    if embeds.is_empty() {
        println!("  (none)");
    }
    for url in &embeds {
        println!("  {}", url);
    }

    println!("\nResolving streams...\n");
    let streams = scraper.list_streams(&id).await;
    if streams.is_empty() {
        println!("No streams found!");
        return Ok(());
    }

    for (i, stream) in streams.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, stream.label, stream.title);
        if let Some(url) = stream.media_url() {
            println!("   Media: {}", url);
        }
        if let Some(url) = stream.external_url() {
            println!("   External: {}", url);
        }
        if let Some(headers) = stream.required_headers() {
            for (name, value) in headers {
                println!("   {}: {}", name, value);
            }
        }
    }

    // Machine-readable form, as an addon would return it
    println!("\n{}", serde_json::to_string_pretty(&streams)?);

    Ok(())
}
