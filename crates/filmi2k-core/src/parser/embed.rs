//! Embed candidate extraction from filmi2k.com detail pages
//!
//! Detail pages reference their players in three ways: an `embedCode`
//! variable holding iframe markup, absolute player URLs somewhere in a
//! script, and plain (often lazy-loaded) iframes.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::url::normalize_protocol;

static EMBED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"embedCode\s*=\s*['"](.+?)['"]\s*;"#).unwrap());
static EMBED_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src=\\?["']([^"'\\]+)"#).unwrap());
static PLAYER_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^"'\s\\]+/(?:embed|e|player)/[^"'\s\\]+"#).unwrap()
});

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());
static IFRAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe").unwrap());

/// Iframe sources containing any of these are ads, trackers or widgets
const BLOCKED_IFRAME_MARKERS: &[&str] = &["google", "facebook", "doubleclick", "ads"];

/// Attributes holding an iframe's source, in lookup order
const IFRAME_SRC_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src"];

/// An extraction strategy over a parsed detail page
pub type EmbedStrategy = fn(&Html) -> Vec<String>;

/// Embed strategies in priority order; discovery order is preserved
pub const EMBED_STRATEGIES: &[(&str, EmbedStrategy)] = &[
    ("embed_code", embed_code_strategy),
    ("script_urls", script_url_strategy),
    ("iframes", iframe_strategy),
];

/// Extracts every embed candidate URL from a detail page
///
/// # Arguments
/// * `html` - Raw HTML of the detail page
///
/// # Returns
/// Candidate URLs in discovery order, without exact duplicates.
/// Empty vec if the page has no players.
pub fn extract_embed_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut candidates: Vec<String> = Vec::new();

    for (_, strategy) in EMBED_STRATEGIES {
        for url in strategy(&document) {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }

    candidates
}

/// `embedCode = '<iframe src="...">';` assignments inside scripts
pub fn embed_code_strategy(document: &Html) -> Vec<String> {
    script_bodies(document)
        .iter()
        .filter_map(|script| {
            let code = EMBED_CODE_RE.captures(script)?.get(1)?.as_str();
            let src = EMBED_SRC_RE.captures(code)?.get(1)?.as_str();
            Some(normalize_protocol(src))
        })
        .collect()
}

/// Absolute URLs with an `/embed/`, `/e/` or `/player/` segment inside scripts
pub fn script_url_strategy(document: &Html) -> Vec<String> {
    script_bodies(document)
        .iter()
        .flat_map(|script| {
            PLAYER_URL_RE
                .find_iter(script)
                .map(|m| m.as_str().replace('\\', ""))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Iframe elements, skipping ad/analytics/social hosts
pub fn iframe_strategy(document: &Html) -> Vec<String> {
    document
        .select(&IFRAME_SELECTOR)
        .filter_map(|iframe| {
            let src = IFRAME_SRC_ATTRS
                .iter()
                .find_map(|attr| iframe.value().attr(attr).filter(|s| !s.trim().is_empty()))?;
            if BLOCKED_IFRAME_MARKERS.iter().any(|m| src.contains(m)) {
                return None;
            }
            Some(normalize_protocol(src.trim()))
        })
        .collect()
}

fn script_bodies(document: &Html) -> Vec<String> {
    document
        .select(&SCRIPT_SELECTOR)
        .map(|script| script.text().collect::<String>())
        .filter(|body| !body.trim().is_empty())
        .collect()
}
