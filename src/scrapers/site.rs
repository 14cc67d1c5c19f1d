use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use super::extract::{DetailPolicy, ExtractContext, ListingPolicy, parse_detail, parse_listing};
use super::http::PageClient;
use super::{DetailedOffer, PriceSource, RawOffer, ScraperConfig, SourceId};
use crate::error::FetchError;

/// Everything that distinguishes one retailer from another.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub source: SourceId,
    pub base_url: String,
    /// Path and query appended to `base_url`; `{query}` is replaced by the encoded search text
    pub search_endpoint_template: &'static str,
    pub listing: ListingPolicy,
    pub detail: DetailPolicy,
}

impl SiteProfile {
    /// Point the profile at another host, e.g. a mirror or a local fixture server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn search_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.search_endpoint_template.replace("{query}", &encoded)
        )
    }
}

/// Retailer adapter driven entirely by a [`SiteProfile`].
pub struct HtmlScraper {
    profile: SiteProfile,
    base_url: Url,
    client: PageClient,
    config: ScraperConfig,
}

impl HtmlScraper {
    pub fn new(profile: SiteProfile, config: ScraperConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&profile.base_url)?;
        let client = PageClient::new(&config)?;

        Ok(Self {
            profile,
            base_url,
            client,
            config,
        })
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    fn context(&self) -> ExtractContext<'_> {
        ExtractContext {
            source: self.profile.source,
            base_url: &self.base_url,
            currency: &self.config.currency,
            out_of_stock_phrases: &self.config.out_of_stock_phrases,
            observed_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PriceSource for HtmlScraper {
    fn source_id(&self) -> SourceId {
        self.profile.source
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<RawOffer> {
        let source = self.profile.source;
        let search_url = self.profile.search_url(query);
        tracing::info!("[{}] Searching for: {}", source, query);

        let body = match self.client.get_page(&search_url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    "[{}] Failed to fetch search results for '{}': {}",
                    source,
                    query,
                    e
                );
                return Vec::new();
            }
        };

        let offers = parse_listing(&body, &self.profile.listing, &self.context(), max_results);
        tracing::info!("[{}] Found {} products for '{}'", source, offers.len(), query);
        offers
    }

    async fn fetch_details(&self, product_url: &str) -> Option<DetailedOffer> {
        let source = self.profile.source;
        tracing::info!("[{}] Fetching details from: {}", source, product_url);

        let url = match self.base_url.join(product_url) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::error!("[{}] Invalid product URL '{}': {}", source, product_url, e);
                return None;
            }
        };

        let body = match self.client.get_page(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("[{}] Failed to fetch product page {}: {}", source, url, e);
                return None;
            }
        };

        let detail = parse_detail(&body, &self.profile.detail, &self.context(), &url);
        if detail.is_none() {
            tracing::warn!("[{}] No product name found on {}", source, url);
        }
        detail
    }
}
