//! Scraper configuration
//!
//! Defaults match the live site. A TOML file plus `FILMI2K_` prefixed
//! environment variables can override any field.

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{Filmi2kError, Result};

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for the HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout for site and embed fetches in seconds (default: 15)
    pub timeout_secs: u64,
    /// Timeout for metadata service calls in seconds (default: 8)
    pub metadata_timeout_secs: u64,
    /// Maximum redirects followed per fetch (default: 5)
    pub max_redirects: usize,
    pub user_agent: String,
    pub accept_language: String,
    /// Fetch relay base URL; site requests become `{relay}/proxy/{encoded url}`
    pub relay_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            metadata_timeout_secs: 8,
            max_redirects: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "bg,en-US;q=0.7,en;q=0.3".to_string(),
            relay_url: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

/// Top-level scraper configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Content site root, without trailing slash
    pub site_url: String,
    /// Metadata service root, without trailing slash
    pub metadata_url: String,
    /// Listings per catalog page (default: 20)
    pub page_size: usize,
    /// Concurrent fetches per group (default: 5)
    pub batch_size: usize,
    /// Short-lived tier: listings, searches, streams (default: 1 hour)
    pub listing_ttl_secs: u64,
    /// Long-lived tier: identifier resolutions and term ids (default: 7 days)
    pub resolution_ttl_secs: u64,
    pub client: ClientConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.filmi2k.com".to_string(),
            metadata_url: "https://v3-cinemeta.strem.io".to_string(),
            page_size: 20,
            batch_size: 5,
            listing_ttl_secs: 3600,
            resolution_ttl_secs: 86400 * 7,
            client: ClientConfig::default(),
        }
    }
}

impl ScraperConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    pub fn resolution_ttl(&self) -> Duration {
        Duration::from_secs(self.resolution_ttl_secs)
    }

    /// Site root with any trailing slash removed
    pub fn site_root(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// Metadata service root with any trailing slash removed
    pub fn metadata_root(&self) -> &str {
        self.metadata_url.trim_end_matches('/')
    }
}

/// Load configuration from a TOML file with environment variable overrides
///
/// Nested keys use a double underscore: `FILMI2K_CLIENT__RELAY_URL`.
pub fn load_config(path: &Path) -> Result<ScraperConfig> {
    if !path.exists() {
        return Err(Filmi2kError::Config(format!(
            "file not found: {}",
            path.display()
        )));
    }

    Figment::from(Serialized::defaults(ScraperConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FILMI2K_").split("__"))
        .extract()
        .map_err(|e| Filmi2kError::Config(e.to_string()))
}

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<ScraperConfig> {
    toml::from_str(toml_str).map_err(|e| Filmi2kError::Config(e.to_string()))
}
