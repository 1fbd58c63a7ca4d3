//! HTTP client for filmi2k.com, embed hosts and the metadata service
//!
//! Every request carries its own timeout and is attempted exactly once.
//! Redirects are followed manually up to a bounded depth.

use std::time::Duration;

use ::url::Url;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Filmi2kError, Result};
use crate::url::build_relay_url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// HTTP client wrapper for all outbound fetches
///
/// Handles:
/// - Browser-like headers (User-Agent, Accept, Accept-Language)
/// - `Referer` of the site root on site and embed requests
/// - Optional fetch relay for site requests
/// - Bounded manual redirect following
#[derive(Clone)]
pub struct Filmi2kClient {
    client: reqwest::Client,
    site_referer: String,
    config: ClientConfig,
}

impl Filmi2kClient {
    /// Create a new client for the given site root
    pub fn new(site_root: &str, config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| Filmi2kError::Config(format!("invalid Accept-Language: {}", e)))?;
        headers.insert(header::ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(Filmi2kError::HttpError)?;

        Ok(Self {
            client,
            site_referer: format!("{}/", site_root.trim_end_matches('/')),
            config,
        })
    }

    /// Fetch a rendered page of the content site
    ///
    /// Goes through the relay when one is configured.
    pub async fn fetch_site(&self, url: &str) -> Result<String> {
        let target = self.route_site(url);
        self.do_fetch(&target, Some(&self.site_referer), self.config.timeout())
            .await
    }

    /// Fetch and decode a structured API response of the content site
    pub async fn fetch_site_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.fetch_site(url).await?;
        decode_json(&body, url)
    }

    /// Fetch an embed page with the site root as Referer
    pub async fn fetch_embed(&self, url: &str) -> Result<String> {
        self.do_fetch(url, Some(&self.site_referer), self.config.timeout())
            .await
    }

    /// Fetch and decode a metadata service response
    pub async fn fetch_metadata_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self
            .do_fetch(url, None, self.config.metadata_timeout())
            .await?;
        decode_json(&body, url)
    }

    fn route_site(&self, url: &str) -> String {
        match &self.config.relay_url {
            Some(relay) => build_relay_url(relay, url),
            None => url.to_string(),
        }
    }

    /// Perform a single fetch, following redirects manually
    async fn do_fetch(&self, url: &str, referer: Option<&str>, timeout: Duration) -> Result<String> {
        let mut current_url = url.to_string();

        for _ in 0..=self.config.max_redirects {
            let mut request = self.client.get(&current_url).timeout(timeout);
            if let Some(referer) = referer {
                request = request.header(header::REFERER, referer);
            }

            let response = request.send().await.map_err(Filmi2kError::HttpError)?;
            let status = response.status();
            debug!(url = %current_url, status = status.as_u16(), "fetched");

            if status.is_redirection() {
                if let Some(location) = response.headers().get(header::LOCATION)
                    && let Ok(loc_str) = location.to_str()
                {
                    current_url = resolve_location(&current_url, loc_str)?;
                    continue;
                }
                return Err(Filmi2kError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: current_url,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(Filmi2kError::NotFound(current_url));
            }

            if !status.is_success() {
                return Err(Filmi2kError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: current_url,
                });
            }

            return response.text().await.map_err(Filmi2kError::HttpError);
        }

        Err(Filmi2kError::TooManyRedirects(url.to_string()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Resolves a `Location` header against the URL that produced it
fn resolve_location(current: &str, location: &str) -> Result<String> {
    let base = Url::parse(current).map_err(|e| Filmi2kError::InvalidUrl(format!("{}: {}", current, e)))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| Filmi2kError::InvalidUrl(format!("{}: {}", location, e)))
}

fn decode_json<T: DeserializeOwned>(body: &str, url: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Filmi2kError::ParseError(format!("{}: {}", url, e)))
}
