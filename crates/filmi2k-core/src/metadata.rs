//! Metadata service client (Cinemeta-compatible)
//!
//! Maps site titles onto canonical movie identifiers and back.

use serde::Deserialize;
use tracing::debug;

use crate::client::Filmi2kClient;
use crate::error::Result;
use crate::types::MetaCandidate;
use crate::url::{build_meta_search_url, build_meta_url};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    metas: Vec<MetaCandidate>,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    meta: Option<MetaDetails>,
}

/// Title and release information for one canonical identifier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetaDetails {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "releaseInfo")]
    pub release_info: Option<String>,
}

impl MetaDetails {
    /// Year from the first four characters of `releaseInfo`
    pub fn release_year(&self) -> Option<u16> {
        let info = self.release_info.as_deref()?;
        info.get(..4)?.parse().ok()
    }
}

/// Picks the candidate that best matches a title and year
///
/// Priority:
/// 1. case-insensitive exact name and exact year
/// 2. exact year, any name
/// 3. the service's first result
///
/// A chosen candidate without an identifier counts as no match.
pub fn select_candidate<'a>(
    candidates: &'a [MetaCandidate],
    title: &str,
    year: Option<u16>,
) -> Option<&'a MetaCandidate> {
    let year = year.map(|y| y.to_string());
    let year_matches = |c: &MetaCandidate| {
        year.is_some() && c.release_info.as_deref() == year.as_deref()
    };
    let title = title.to_lowercase();

    candidates
        .iter()
        .find(|c| {
            year_matches(*c)
                && c.name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase() == title)
        })
        .or_else(|| candidates.iter().find(|c| year_matches(*c)))
        .or_else(|| candidates.first())
        .filter(|c| !c.id.is_empty())
}

/// Read-only client for the metadata service
#[derive(Clone)]
pub struct MetadataClient {
    http: Filmi2kClient,
    base_url: String,
}

impl MetadataClient {
    pub fn new(http: Filmi2kClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Searches movies by title, in the service's own ranking
    pub async fn search(&self, title: &str) -> Result<Vec<MetaCandidate>> {
        let url = build_meta_search_url(&self.base_url, title);
        debug!(title = %title, "metadata search");
        let response: SearchResponse = self.http.fetch_metadata_json(&url).await?;
        Ok(response.metas)
    }

    /// Fetches title and release info for a canonical identifier
    pub async fn get(&self, canonical_id: &str) -> Result<Option<MetaDetails>> {
        let url = build_meta_url(&self.base_url, canonical_id);
        debug!(id = %canonical_id, "metadata lookup");
        let response: MetaResponse = self.http.fetch_metadata_json(&url).await?;
        Ok(response.meta)
    }
}
