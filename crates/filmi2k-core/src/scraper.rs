//! Main scraper API for filmi2k.com
//!
//! Combines the HTTP client, the parsers, the metadata service and the
//! shared cache into the three lookups an addon needs: catalog pages,
//! free-text search and streams for a canonical identifier.
//!
//! None of the public lookups fail. Network and parse failures are logged
//! and turned into empty results at the smallest unit of work (one page,
//! one listing, one embed).

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{ScraperState, cache_key};
use crate::catalog::{Category, category_by_id};
use crate::client::Filmi2kClient;
use crate::config::ScraperConfig;
use crate::error::{Filmi2kError, Result};
use crate::metadata::{MetadataClient, select_candidate};
use crate::parser::embed::extract_embed_candidates;
use crate::parser::listing::{
    ApiPost, ApiTerm, dedupe_listings, find_slug_by_year, parse_api_posts, parse_listing_page,
    parse_title,
};
use crate::parser::media::{build_stream_descriptors, scan_embed_page};
use crate::types::{CatalogEntry, RawListing, ResolvedMeta, StreamDescriptor};
use crate::url::{
    build_category_url, build_detail_url, build_posts_search_url, build_posts_url,
    build_search_url, build_term_url, embed_host_label, site_domain,
};

/// Title suffix of an embed exposed as an external link
const PLAYER_SUFFIX: &str = "Плейър";
/// Title of the detail page exposed as an external link
const OPEN_IN_BROWSER: &str = "Отвори във браузър";

/// What a listing lookup is for
#[derive(Debug, Clone, Copy)]
pub enum ListingQuery<'a> {
    /// One 1-based page of a category
    Category {
        category: &'static Category,
        page: usize,
    },
    /// Free-text search
    Search(&'a str),
}

/// Ways of discovering listings, tried in [`LISTING_STRATEGIES`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStrategy {
    /// Site REST API, field-limited to link and title
    StructuredApi,
    /// Rendered category or search page
    Markup,
}

pub const LISTING_STRATEGIES: &[ListingStrategy] =
    &[ListingStrategy::StructuredApi, ListingStrategy::Markup];

/// Ways of locating the detail page slug of a canonical id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugStrategy {
    /// Slugs recorded while resolving listings
    ReverseIndex,
    /// Metadata title + year, matched against a site search
    SiteSearch,
}

pub const SLUG_STRATEGIES: &[SlugStrategy] = &[SlugStrategy::ReverseIndex, SlugStrategy::SiteSearch];

/// A located detail page and the players it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub slug: String,
    pub url: String,
    pub embeds: Vec<String>,
}

/// Main scraper API for filmi2k.com
///
/// Cheap lookups hit the shared [`ScraperState`]; everything else fans out
/// in groups of `batch_size` concurrent fetches.
pub struct Filmi2kScraper {
    config: ScraperConfig,
    client: Filmi2kClient,
    metadata: MetadataClient,
    state: Arc<ScraperState>,
    domain: String,
}

impl Filmi2kScraper {
    /// Create a new scraper for the live site with default configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new scraper with its own, empty state
    ///
    /// # Arguments
    /// * `config` - Scraper configuration
    ///
    /// # Errors
    /// - `InvalidUrl` if the site URL has no host
    /// - `Config` / `HttpError` if HTTP client initialization fails
    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let state = Arc::new(ScraperState::new(
            config.listing_ttl(),
            config.resolution_ttl(),
        ));
        Self::with_state(config, state)
    }

    /// Create a scraper sharing an existing state
    ///
    /// Several scrapers (or tests) can hand the same state around, or each
    /// take an isolated one.
    pub fn with_state(config: ScraperConfig, state: Arc<ScraperState>) -> Result<Self> {
        let domain = site_domain(config.site_root())
            .ok_or_else(|| Filmi2kError::InvalidUrl(config.site_url.clone()))?;
        let client = Filmi2kClient::new(config.site_root(), config.client.clone())?;
        let metadata = MetadataClient::new(client.clone(), config.metadata_root());

        Ok(Self {
            config,
            client,
            metadata,
            state,
            domain,
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Shared cache and reverse index
    pub fn state(&self) -> &Arc<ScraperState> {
        &self.state
    }

    /// Lists one page of a category
    ///
    /// # Arguments
    /// * `category_id` - Catalog identifier (e.g. "filmi2k-drama")
    /// * `offset` - Zero-based result offset; pages hold `page_size` items
    ///
    /// # Returns
    /// Resolved catalog entries, at most one page. Unknown categories,
    /// unreachable pages and unresolvable listings all yield fewer (or no)
    /// entries rather than an error.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> filmi2k_core::Result<()> {
    /// use filmi2k_core::Filmi2kScraper;
    /// let scraper = Filmi2kScraper::new()?;
    /// for entry in scraper.list_catalog("filmi2k-drama", 0).await {
    ///     println!("{}: {}", entry.canonical_id, entry.display_name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_catalog(&self, category_id: &str, offset: usize) -> Vec<CatalogEntry> {
        let Some(category) = category_by_id(category_id) else {
            let e = Filmi2kError::UnknownCategory(category_id.to_string());
            warn!(error = %e, "catalog lookup skipped");
            return Vec::new();
        };

        let page = offset / self.page_size() + 1;
        let page_param = page.to_string();
        let key = cache_key("catalog", &[category.id, page_param.as_str()]);
        if let Some(entries) = self.state.listings.get(&key) {
            debug!(catalog = %category.id, page, "catalog cache hit");
            return entries;
        }

        let query = ListingQuery::Category { category, page };
        let Some(listings) = self.discover_listings(&query).await else {
            return Vec::new();
        };

        let entries = self.resolve_listings(&listings).await;
        info!(
            catalog = %category.id,
            page,
            "{}/{} resolved",
            entries.len(),
            listings.len()
        );
        self.state.listings.insert(key, entries.clone());
        entries
    }

    /// Searches the site and resolves the hits
    ///
    /// An empty or whitespace-only query yields no entries.
    pub async fn search(&self, query: &str) -> Vec<CatalogEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let key = cache_key("search", &[query]);
        if let Some(entries) = self.state.listings.get(&key) {
            debug!(query = %query, "search cache hit");
            return entries;
        }

        let Some(listings) = self.discover_listings(&ListingQuery::Search(query)).await else {
            return Vec::new();
        };

        let entries = self.resolve_listings(&listings).await;
        info!(query = %query, "{}/{} resolved", entries.len(), listings.len());
        self.state.listings.insert(key, entries.clone());
        entries
    }

    /// Lists playable streams for a canonical identifier
    ///
    /// # Returns
    /// Direct media streams recovered from the movie's embeds. When none can
    /// be recovered, one external link per embed; when the page has no
    /// embeds, one external link to the page itself. Empty only when the
    /// identifier is outside the `tt` namespace or no detail page is found.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> filmi2k_core::Result<()> {
    /// use filmi2k_core::Filmi2kScraper;
    /// let scraper = Filmi2kScraper::new()?;
    /// for stream in scraper.list_streams("tt1375666").await {
    ///     println!("{}: {:?}", stream.title, stream.media_url());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_streams(&self, canonical_id: &str) -> Vec<StreamDescriptor> {
        if !canonical_id.starts_with("tt") {
            debug!(id = %canonical_id, "not a canonical movie id");
            return Vec::new();
        }

        let key = cache_key("streams", &[canonical_id]);
        if let Some(streams) = self.state.streams.get(&key) {
            debug!(id = %canonical_id, "streams cache hit");
            return streams;
        }

        let Some(detail) = self.detail_page(canonical_id).await else {
            info!(id = %canonical_id, "no detail page found");
            return Vec::new();
        };

        let mut streams = Vec::new();
        for group in detail.embeds.chunks(self.batch_size()) {
            let resolved = join_all(group.iter().map(|url| self.resolve_embed(url))).await;
            streams.extend(resolved.into_iter().flatten());
        }

        if streams.is_empty() {
            streams = detail
                .embeds
                .iter()
                .map(|url| {
                    StreamDescriptor::external(
                        format!("{} - {}", embed_host_label(url), PLAYER_SUFFIX),
                        url.clone(),
                    )
                })
                .collect();
        }
        if streams.is_empty() {
            streams.push(StreamDescriptor::external(
                OPEN_IN_BROWSER.to_string(),
                detail.url.clone(),
            ));
        }

        info!(
            id = %canonical_id,
            slug = %detail.slug,
            "{} -> {}: {} streams",
            canonical_id,
            detail.slug,
            streams.len()
        );
        self.state.streams.insert(key, streams.clone());
        streams
    }

    /// Runs the listing strategies in order until one finds anything
    ///
    /// # Returns
    /// `None` when every strategy failed, `Some` (possibly empty) once at
    /// least one strategy produced an answer.
    pub async fn discover_listings(&self, query: &ListingQuery<'_>) -> Option<Vec<RawListing>> {
        let mut answered = false;

        for strategy in LISTING_STRATEGIES {
            match self.listings_with(*strategy, query).await {
                Ok(listings) if !listings.is_empty() => {
                    debug!(?strategy, count = listings.len(), "listings found");
                    return Some(dedupe_listings(listings, self.page_size()));
                }
                Ok(_) => {
                    debug!(?strategy, "strategy found no listings");
                    answered = true;
                }
                Err(e) => warn!(?strategy, error = %e, "listing strategy failed"),
            }
        }

        answered.then(Vec::new)
    }

    /// Runs a single listing strategy
    pub async fn listings_with(
        &self,
        strategy: ListingStrategy,
        query: &ListingQuery<'_>,
    ) -> Result<Vec<RawListing>> {
        match strategy {
            ListingStrategy::StructuredApi => self.listings_via_api(query).await,
            ListingStrategy::Markup => self.listings_via_markup(query).await,
        }
    }

    /// Lists posts through the site's REST API
    ///
    /// A category whose term is unknown to the API yields no listings.
    pub async fn listings_via_api(&self, query: &ListingQuery<'_>) -> Result<Vec<RawListing>> {
        let site = self.config.site_root();
        let url = match query {
            ListingQuery::Category { category, page } => {
                let term = match category.filter.taxonomy() {
                    None => None,
                    Some((taxonomy, slug)) => match self.term_id(taxonomy, slug).await? {
                        Some(id) => Some((taxonomy, id)),
                        None => {
                            debug!(taxonomy, slug, "term not found");
                            return Ok(Vec::new());
                        }
                    },
                };
                build_posts_url(site, term, *page, self.page_size())
            }
            ListingQuery::Search(text) => build_posts_search_url(site, text, self.page_size()),
        };

        let posts: Vec<ApiPost> = self.client.fetch_site_json(&url).await?;
        Ok(parse_api_posts(&posts))
    }

    /// Scrapes the rendered category or search page
    pub async fn listings_via_markup(&self, query: &ListingQuery<'_>) -> Result<Vec<RawListing>> {
        let site = self.config.site_root();
        let url = match query {
            ListingQuery::Category { category, page } => {
                build_category_url(site, category.path, *page)
            }
            ListingQuery::Search(text) => build_search_url(site, text),
        };

        let html = self.client.fetch_site(&url).await?;
        Ok(parse_listing_page(&html, &self.domain))
    }

    /// Looks up the REST id of a taxonomy term, cached in the long-lived tier
    async fn term_id(&self, taxonomy: &str, slug: &str) -> Result<Option<u64>> {
        let key = cache_key("term", &[taxonomy, slug]);
        if let Some(id) = self.state.terms.get(&key) {
            return Ok(Some(id));
        }

        let url = build_term_url(self.config.site_root(), taxonomy, slug);
        let terms: Vec<ApiTerm> = self.client.fetch_site_json(&url).await?;
        let id = terms.first().map(|t| t.id);
        if let Some(id) = id {
            self.state.terms.insert(key, id);
        }
        Ok(id)
    }

    /// Resolves listings in fixed-size concurrent groups, dropping misses
    async fn resolve_listings(&self, listings: &[RawListing]) -> Vec<CatalogEntry> {
        let mut entries = Vec::new();
        for group in listings.chunks(self.batch_size()) {
            let resolved = join_all(group.iter().map(|listing| async move {
                self.resolve_identifier(listing)
                    .await
                    .map(|meta| CatalogEntry::from_resolved(listing, &meta))
            }))
            .await;
            entries.extend(resolved.into_iter().flatten());
        }
        entries
    }

    /// Maps a listing to its canonical identifier and poster
    ///
    /// Cached per slug in the long-lived tier. Every resolution, cached or
    /// fresh, is recorded in the reverse index.
    ///
    /// # Returns
    /// `None` when the metadata service has no match or cannot be reached
    pub async fn resolve_identifier(&self, listing: &RawListing) -> Option<ResolvedMeta> {
        let key = cache_key("resolve", &[listing.site_slug.as_str()]);
        if let Some(meta) = self.state.resolutions.get(&key) {
            self.state.remember_slug(&meta.canonical_id, &meta.site_slug);
            return Some(meta);
        }

        let parsed = parse_title(&listing.title);
        if parsed.latin.is_empty() {
            return None;
        }
        let year = parsed.year.or(listing.year_hint);

        let candidates = match self.metadata.search(&parsed.latin).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(slug = %listing.site_slug, error = %e, "metadata search failed");
                return None;
            }
        };

        let Some(chosen) = select_candidate(&candidates, &parsed.latin, year) else {
            debug!(title = %parsed.latin, "no metadata match");
            return None;
        };

        let meta = ResolvedMeta {
            canonical_id: chosen.id.clone(),
            poster_url: chosen.poster.clone().unwrap_or_default(),
            site_slug: listing.site_slug.clone(),
        };
        self.state.resolutions.insert(key, meta.clone());
        self.state.remember_slug(&meta.canonical_id, &meta.site_slug);
        Some(meta)
    }

    /// Finds the detail page slug of a canonical id
    ///
    /// Tries the [`SLUG_STRATEGIES`] in order.
    pub async fn find_slug(&self, canonical_id: &str) -> Option<String> {
        for strategy in SLUG_STRATEGIES {
            let slug = match strategy {
                SlugStrategy::ReverseIndex => self.state.slug_for(canonical_id),
                SlugStrategy::SiteSearch => match self.slug_via_site_search(canonical_id).await {
                    Ok(slug) => slug,
                    Err(e) => {
                        warn!(id = %canonical_id, error = %e, "slug search failed");
                        None
                    }
                },
            };
            if slug.is_some() {
                debug!(id = %canonical_id, ?strategy, "slug located");
                return slug;
            }
        }
        None
    }

    /// Searches the site for the metadata title and picks the hit whose
    /// year matches the release year; a match is recorded in the reverse index
    pub async fn slug_via_site_search(&self, canonical_id: &str) -> Result<Option<String>> {
        let Some(details) = self.metadata.get(canonical_id).await? else {
            return Ok(None);
        };
        let (Some(name), Some(year)) = (details.name.as_deref(), details.release_year()) else {
            return Ok(None);
        };

        let url = build_search_url(self.config.site_root(), name);
        let html = self.client.fetch_site(&url).await?;
        let slug = find_slug_by_year(&html, &self.domain, year);
        if let Some(slug) = &slug {
            self.state.remember_slug(canonical_id, slug);
        }
        Ok(slug)
    }

    /// Locates and fetches the detail page of a canonical id
    ///
    /// `None` if no slug is known or the page cannot be fetched.
    pub async fn detail_page(&self, canonical_id: &str) -> Option<DetailPage> {
        let slug = self.find_slug(canonical_id).await?;
        let url = build_detail_url(self.config.site_root(), &slug);

        let html = match self.client.fetch_site(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(id = %canonical_id, url = %url, error = %e, "detail page fetch failed");
                return None;
            }
        };

        let embeds = extract_embed_candidates(&html);
        debug!(slug = %slug, count = embeds.len(), "embed candidates");
        Some(DetailPage { slug, url, embeds })
    }

    /// Embed candidate URLs of a canonical id's detail page
    pub async fn embed_candidates(&self, canonical_id: &str) -> Vec<String> {
        self.detail_page(canonical_id)
            .await
            .map(|detail| detail.embeds)
            .unwrap_or_default()
    }

    /// Fetches one embed and turns its media into stream descriptors
    ///
    /// Unreachable or empty embeds yield no descriptors.
    pub async fn resolve_embed(&self, embed_url: &str) -> Vec<StreamDescriptor> {
        let html = match self.client.fetch_embed(embed_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %embed_url, error = %e, "embed fetch failed");
                return Vec::new();
            }
        };

        let scan = scan_embed_page(&html);
        debug!(
            url = %embed_url,
            hls = scan.hls.len(),
            mp4 = scan.mp4.len(),
            unpacked = scan.unpacked,
            "embed scanned"
        );
        build_stream_descriptors(embed_url, &scan)
    }

    fn page_size(&self) -> usize {
        self.config.page_size.max(1)
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.max(1)
    }
}
