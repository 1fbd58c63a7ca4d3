//! URL helper functions for filmi2k.com, its REST API and embed hosts
//!
//! Builders take the site root explicitly so a mirror or a mock server can
//! stand in for the live site.

use ::url::Url;

/// Builds the rendered page URL for a category path and 1-based page
///
/// # Example
/// ```
/// use filmi2k_core::url::build_category_url;
/// let url = build_category_url("https://www.filmi2k.com", "/category/filmi-drama/", 2);
/// assert_eq!(url, "https://www.filmi2k.com/category/filmi-drama/page/2/");
/// ```
pub fn build_category_url(site: &str, path: &str, page: usize) -> String {
    let mut url = format!("{}{}", site, path);
    if page > 1 {
        url.push_str(&format!("page/{}/", page));
    }
    url
}

/// Builds the rendered search page URL
///
/// # Example
/// ```
/// use filmi2k_core::url::build_search_url;
/// let url = build_search_url("https://www.filmi2k.com", "the matrix");
/// assert_eq!(url, "https://www.filmi2k.com/?s=the%20matrix");
/// ```
pub fn build_search_url(site: &str, query: &str) -> String {
    format!("{}/?s={}", site, urlencoding::encode(query))
}

/// Builds the detail page URL for a slug
pub fn build_detail_url(site: &str, slug: &str) -> String {
    format!("{}/{}/", site, slug)
}

/// Builds the REST lookup for a taxonomy term by slug
pub fn build_term_url(site: &str, taxonomy: &str, slug: &str) -> String {
    format!(
        "{}/wp-json/wp/v2/{}?slug={}&_fields=id",
        site,
        taxonomy,
        urlencoding::encode(slug)
    )
}

/// Builds the REST post listing, optionally filtered by one taxonomy term
pub fn build_posts_url(
    site: &str,
    term: Option<(&str, u64)>,
    page: usize,
    per_page: usize,
) -> String {
    let mut url = format!(
        "{}/wp-json/wp/v2/posts?page={}&per_page={}&_fields=link,title",
        site, page, per_page
    );
    if let Some((taxonomy, id)) = term {
        url.push_str(&format!("&{}={}", taxonomy, id));
    }
    url
}

/// Builds the REST free-text search over posts
pub fn build_posts_search_url(site: &str, query: &str, per_page: usize) -> String {
    format!(
        "{}/wp-json/wp/v2/posts?search={}&per_page={}&_fields=link,title",
        site,
        urlencoding::encode(query),
        per_page
    )
}

/// Builds the metadata service title search
pub fn build_meta_search_url(metadata: &str, title: &str) -> String {
    format!(
        "{}/catalog/movie/top/search={}.json",
        metadata,
        urlencoding::encode(title)
    )
}

/// Builds the metadata service lookup for one canonical id
pub fn build_meta_url(metadata: &str, canonical_id: &str) -> String {
    format!("{}/meta/movie/{}.json", metadata, canonical_id)
}

/// Wraps a target URL for the fetch relay (`{relay}/proxy/{encoded}`)
pub fn build_relay_url(relay: &str, target: &str) -> String {
    format!(
        "{}/proxy/{}",
        relay.trim_end_matches('/'),
        urlencoding::encode(target)
    )
}

/// Host (and port, when explicit) of the site with any `www.` dropped
///
/// Scraped links are matched against this, so both `www.` and bare links
/// are accepted.
pub fn site_domain(site: &str) -> Option<String> {
    let url = Url::parse(site).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Extracts the detail slug from an absolute or site-relative link
///
/// # Example
/// ```
/// use filmi2k_core::url::slug_from_url;
/// assert_eq!(
///     slug_from_url("https://www.filmi2k.com/inception-2010/"),
///     Some("inception-2010".to_string())
/// );
/// ```
pub fn slug_from_url(link: &str) -> Option<String> {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.split(['?', '#']).next().unwrap_or(link).to_string(),
    };
    let slug = path.trim_matches('/');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Turns protocol-relative URLs (`//host/...`) into explicit HTTPS
pub fn normalize_protocol(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Scheme and host of a URL, as sent in an `Origin` header
///
/// # Example
/// ```
/// use filmi2k_core::url::origin_of;
/// assert_eq!(
///     origin_of("https://vidhost.example/e/abc?x=1"),
///     Some("https://vidhost.example".to_string())
/// );
/// ```
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}

/// Short display name for an embed host ("https://www.vidhost.to/e/1" -> "Vidhost")
pub fn embed_host_label(url: &str) -> String {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return "Stream".to_string();
    };

    let host = host.trim_start_matches("www.");
    let first = host.split('.').next().unwrap_or(host);
    let mut chars = first.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => "Stream".to_string(),
    }
}
