//! Listing parsers for filmi2k.com
//!
//! Turns structured API posts or rendered category/search pages into
//! [`RawListing`] values. Markup extraction is an ordered list of
//! strategies; the first one that yields anything wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::types::RawListing;
use crate::url::slug_from_url;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d{4})\)").unwrap());
static YEAR_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)\s*").unwrap());
static AUDIO_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*BG Audio\s*").unwrap());

static ARTICLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"article, .video-item, .post, .item-video, div[id^="post-"]"#).unwrap()
});
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".entry-title, h2, h3, .title").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Link fragments that never point at a movie
const NAVIGATION_MARKERS: &[&str] = &["/category/", "/tag/", "/page/"];
const LINK_NOISE_MARKERS: &[&str] = &["#", "svarzhete-se", "?filter=", "?s="];

/// A post as returned by the structured API with `_fields=link,title`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPost {
    pub link: String,
    pub title: RenderedText,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderedText {
    pub rendered: String,
}

/// A taxonomy term as returned with `_fields=id`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTerm {
    pub id: u64,
}

/// A title split into the part used for metadata lookups and its year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub latin: String,
    pub year: Option<u16>,
}

/// Parses the first `(YYYY)` token of a title
///
/// Returns `None` when there is no such token.
pub fn parse_year(title: &str) -> Option<u16> {
    YEAR_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Splits a bilingual site title into its Latin-script part and year
///
/// "Inception / Генезис (2010) BG Audio" -> ("Inception", Some(2010))
pub fn parse_title(full: &str) -> ParsedTitle {
    let year = parse_year(full);
    let latin = match full.find(" / ") {
        Some(idx) if idx > 0 => full[..idx].trim(),
        _ => full,
    };
    let latin = YEAR_TOKEN_RE.replace(latin, " ");
    let latin = AUDIO_MARKER_RE.replace(&latin, " ");
    let latin = latin.split_whitespace().collect::<Vec<_>>().join(" ");

    ParsedTitle { latin, year }
}

/// Decodes HTML entities and drops inline markup from a rendered title
pub fn decode_entities(rendered: &str) -> String {
    let fragment = Html::parse_fragment(rendered);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Converts structured API posts into listings
pub fn parse_api_posts(posts: &[ApiPost]) -> Vec<RawListing> {
    posts
        .iter()
        .filter_map(|post| {
            let title = decode_entities(&post.title.rendered);
            if title.is_empty() {
                return None;
            }
            let site_slug = slug_from_url(&post.link)?;
            Some(RawListing {
                year_hint: parse_year(&title),
                title,
                site_slug,
            })
        })
        .collect()
}

/// A markup extraction strategy: page HTML + site domain -> listings
pub type MarkupStrategy = fn(&str, &str) -> Vec<RawListing>;

/// Markup strategies in priority order
pub const MARKUP_STRATEGIES: &[(&str, MarkupStrategy)] =
    &[("articles", article_strategy), ("links", link_strategy)];

/// Parses a rendered category or search page
///
/// # Arguments
/// * `html` - Raw page HTML
/// * `domain` - Site domain as produced by [`crate::url::site_domain`]
///
/// # Returns
/// Listings from the first strategy that finds any, deduplicated by slug.
pub fn parse_listing_page(html: &str, domain: &str) -> Vec<RawListing> {
    for (_, strategy) in MARKUP_STRATEGIES {
        let listings = strategy(html, domain);
        if !listings.is_empty() {
            return dedupe_listings(listings, usize::MAX);
        }
    }
    Vec::new()
}

/// Post containers holding a link to the site and a title-like child
pub fn article_strategy(html: &str, domain: &str) -> Vec<RawListing> {
    let document = Html::parse_document(html);
    let site_marker = format!("{}/", domain);
    let mut listings = Vec::new();

    for container in document.select(&ARTICLE_SELECTOR) {
        let Some(link) = container.select(&LINK_SELECTOR).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains(&site_marker) || contains_any(href, NAVIGATION_MARKERS) {
            continue;
        }

        let title = container_title(&container, &link);
        if title.is_empty() {
            continue;
        }
        let Some(site_slug) = slug_from_url(href) else {
            continue;
        };

        listings.push(RawListing {
            year_hint: parse_year(&title),
            title,
            site_slug,
        });
    }

    listings
}

/// Last resort: every site link shaped like `/{name}-{YYYY}...`
pub fn link_strategy(html: &str, domain: &str) -> Vec<RawListing> {
    let Ok(movie_link) = Regex::new(&format!(r"{}/[\w-]+-\d{{4}}", regex::escape(domain))) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if contains_any(href, NAVIGATION_MARKERS)
            || contains_any(href, LINK_NOISE_MARKERS)
            || !movie_link.is_match(href)
        {
            continue;
        }

        let text = element_text(&link);
        let title = if text.is_empty() {
            link.value().attr("title").unwrap_or_default().trim().to_string()
        } else {
            text
        };
        if title.chars().count() < 3 {
            continue;
        }

        let Some(site_slug) = slug_from_url(href) else {
            continue;
        };
        if !seen.insert(site_slug.clone()) {
            continue;
        }

        listings.push(RawListing {
            year_hint: parse_year(&title),
            title,
            site_slug,
        });
    }

    listings
}

/// Scans search result links for one whose `(YYYY)` token equals `year`
///
/// Used to locate a detail page when only the metadata title is known.
pub fn find_slug_by_year(html: &str, domain: &str, year: u16) -> Option<String> {
    let document = Html::parse_document(html);
    let site_marker = format!("{}/", domain);

    document.select(&LINK_SELECTOR).find_map(|link| {
        let href = link.value().attr("href")?;
        if !href.contains(&site_marker) || href.contains("/category/") || href.contains("/tag/") {
            return None;
        }
        let text = element_text(&link);
        if text.is_empty() || parse_year(&text) != Some(year) {
            return None;
        }
        slug_from_url(href)
    })
}

/// Drops repeated slugs (first occurrence wins) and caps the result
pub fn dedupe_listings(listings: Vec<RawListing>, cap: usize) -> Vec<RawListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|l| seen.insert(l.site_slug.clone()))
        .take(cap)
        .collect()
}

fn container_title(container: &ElementRef, link: &ElementRef) -> String {
    if let Some(heading) = container.select(&TITLE_SELECTOR).next() {
        let text = element_text(&heading);
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(title) = link.value().attr("title") {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }
    element_text(link)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
