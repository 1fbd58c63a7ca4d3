//! Media URL extraction from embed pages
//!
//! Scans (unpacked) player scripts for HLS playlists and progressive MP4
//! files and turns them into stream descriptors carrying the headers the
//! media host expects.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::parser::packer::{detect_packed, unpack};
use crate::types::{MediaKind, StreamDescriptor};
use crate::url::{embed_host_label, origin_of};

static M3U8_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^"'\s\\,)]+\.m3u8[^"'\s\\,)]*"#).unwrap());
static MP4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^"'\s\\,)]+\.mp4[^"'\s\\,)]*"#).unwrap());
/// Plain-text fallback over the raw page, tolerant of commas and parens
static LOOSE_M3U8_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^"'\s\\]+\.m3u8[^"'\s\\]*"#).unwrap());

const TRAILING_NOISE: &[char] = &[';', ']', '}', '>', '.'];

/// Media found on one embed page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaScan {
    pub hls: Vec<String>,
    pub mp4: Vec<String>,
    /// A quoted "HD" token was present in the scanned script
    pub hd: bool,
    /// The page carried a packed script that was successfully reversed
    pub unpacked: bool,
}

impl MediaScan {
    pub fn is_empty(&self) -> bool {
        self.hls.is_empty() && self.mp4.is_empty()
    }
}

/// Scans a fetched embed page for direct media URLs
///
/// Unpacks a packed script when present and scans the result, otherwise
/// scans the raw page. If neither yields anything, the raw page gets one
/// more, looser pass for HLS playlists.
pub fn scan_embed_page(html: &str) -> MediaScan {
    let unpacked = detect_packed(html).and_then(|packed| match unpack(&packed) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "failed to unpack embed script");
            None
        }
    });
    let text = unpacked.as_deref().unwrap_or(html);

    let mut scan = MediaScan {
        hls: extract_urls(&M3U8_RE, text),
        mp4: extract_urls(&MP4_RE, text),
        hd: has_hd_marker(text),
        unpacked: unpacked.is_some(),
    };

    if scan.is_empty() {
        scan.hls = extract_urls(&LOOSE_M3U8_RE, html);
        if !scan.hls.is_empty() {
            // Quality markers are only trusted in unpacked scripts
            scan.hd = false;
            debug!(count = scan.hls.len(), "HLS found by plain-text fallback");
        }
    }

    scan
}

/// Finds all URLs matching `pattern`, cleaned and without duplicates
pub fn extract_urls(pattern: &Regex, text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for m in pattern.find_iter(text) {
        let clean = clean_media_url(m.as_str());
        if !urls.contains(&clean) {
            urls.push(clean);
        }
    }
    urls
}

/// Extracts HLS playlist URLs
pub fn extract_hls_urls(text: &str) -> Vec<String> {
    extract_urls(&M3U8_RE, text)
}

/// Extracts progressive MP4 URLs
pub fn extract_mp4_urls(text: &str) -> Vec<String> {
    extract_urls(&MP4_RE, text)
}

/// Case-sensitive check for a quoted `HD` token
pub fn has_hd_marker(text: &str) -> bool {
    text.contains("\"HD\"") || text.contains("'HD'")
}

fn clean_media_url(raw: &str) -> String {
    raw.replace('\\', "")
        .trim_end_matches(TRAILING_NOISE)
        .to_string()
}

/// Builds labelled descriptors for everything found at `embed_url`
///
/// Each descriptor requires `Referer: embed_url` and `Origin` of the
/// embed's scheme and host.
pub fn build_stream_descriptors(embed_url: &str, scan: &MediaScan) -> Vec<StreamDescriptor> {
    let host = embed_host_label(embed_url);
    let origin = origin_of(embed_url).unwrap_or_else(|| embed_url.to_string());
    let hd = if scan.hd { " HD" } else { "" };

    let hls = scan.hls.iter().map(|url| {
        StreamDescriptor::media(
            format!("{}{} ({})", host, hd, MediaKind::Hls.tag()),
            url.clone(),
            MediaKind::Hls,
            embed_url,
            &origin,
        )
    });
    let mp4 = scan.mp4.iter().map(|url| {
        StreamDescriptor::media(
            format!("{} ({})", host, MediaKind::Mp4.tag()),
            url.clone(),
            MediaKind::Mp4,
            embed_url,
            &origin,
        )
    });

    hls.chain(mp4).collect()
}
