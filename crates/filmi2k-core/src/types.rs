//! Core data types for the filmi2k scraper
//!
//! Contains the values that flow between listing discovery, identifier
//! resolution and stream assembly, plus the externally visible results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label shown next to every stream produced by this addon
pub const STREAM_LABEL: &str = "Filmi2K";

/// A movie listing scraped from the site, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    /// Title as shown on the site (often "Latin / Cyrillic (YYYY)")
    pub title: String,

    /// Year parsed from a `(YYYY)` token in the title, if any
    pub year_hint: Option<u16>,

    /// Path segment of the detail page (e.g. "inception-2010")
    pub site_slug: String,
}

/// Result of cross-referencing a listing with the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMeta {
    /// Canonical identifier (e.g. "tt1375666")
    pub canonical_id: String,

    /// Poster URL, empty when the service has none
    pub poster_url: String,

    /// Slug the resolution was derived from
    pub site_slug: String,
}

/// Externally visible catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "id")]
    pub canonical_id: String,

    /// Always "movie"
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "name")]
    pub display_name: String,

    #[serde(rename = "poster")]
    pub poster_url: String,
}

impl CatalogEntry {
    /// Builds a catalog entry from a listing and its resolution
    pub fn from_resolved(listing: &RawListing, meta: &ResolvedMeta) -> Self {
        Self {
            canonical_id: meta.canonical_id.clone(),
            kind: "movie".to_string(),
            display_name: listing.title.clone(),
            poster_url: meta.poster_url.clone(),
        }
    }
}

/// One candidate returned by the metadata search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaCandidate {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Release year as the service renders it ("2010", "2010-2014")
    #[serde(default, rename = "releaseInfo")]
    pub release_info: Option<String>,

    #[serde(default)]
    pub poster: Option<String>,
}

/// Delivery format of a direct media URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// HLS playlist (`.m3u8`)
    Hls,
    /// Progressive download (`.mp4`)
    Mp4,
}

impl MediaKind {
    /// Suffix shown in stream titles
    pub fn tag(self) -> &'static str {
        match self {
            MediaKind::Hls => "HLS",
            MediaKind::Mp4 => "MP4",
        }
    }
}

/// Where a stream points: a playable resource or a page to open externally
///
/// Being an enum, a descriptor can never carry both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamSource {
    Media {
        #[serde(rename = "url")]
        media_url: String,

        kind: MediaKind,

        /// Headers the player must send (`Referer`, `Origin`)
        #[serde(rename = "proxyHeaders")]
        required_headers: BTreeMap<String, String>,

        #[serde(rename = "notWebReady")]
        not_web_ready: bool,
    },
    External {
        #[serde(rename = "externalUrl")]
        external_url: String,
    },
}

/// A stream offered for a canonical identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    #[serde(rename = "name")]
    pub label: String,

    pub title: String,

    #[serde(flatten)]
    pub source: StreamSource,
}

impl StreamDescriptor {
    /// Direct media stream that needs the embed's Referer/Origin
    pub fn media(
        title: String,
        media_url: String,
        kind: MediaKind,
        referer: &str,
        origin: &str,
    ) -> Self {
        let mut required_headers = BTreeMap::new();
        required_headers.insert("Referer".to_string(), referer.to_string());
        required_headers.insert("Origin".to_string(), origin.to_string());

        Self {
            label: STREAM_LABEL.to_string(),
            title,
            source: StreamSource::Media {
                media_url,
                kind,
                required_headers,
                not_web_ready: true,
            },
        }
    }

    /// Opaque link the player opens externally
    pub fn external(title: String, external_url: String) -> Self {
        Self {
            label: STREAM_LABEL.to_string(),
            title,
            source: StreamSource::External { external_url },
        }
    }

    /// Direct media URL, if this is a playable stream
    pub fn media_url(&self) -> Option<&str> {
        match &self.source {
            StreamSource::Media { media_url, .. } => Some(media_url),
            StreamSource::External { .. } => None,
        }
    }

    /// External link, if this is not a direct stream
    pub fn external_url(&self) -> Option<&str> {
        match &self.source {
            StreamSource::External { external_url } => Some(external_url),
            StreamSource::Media { .. } => None,
        }
    }

    /// Headers required by the media host (empty for external links)
    pub fn required_headers(&self) -> Option<&BTreeMap<String, String>> {
        match &self.source {
            StreamSource::Media {
                required_headers, ..
            } => Some(required_headers),
            StreamSource::External { .. } => None,
        }
    }
}
