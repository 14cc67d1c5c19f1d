//! Price Aggregator Service
//!
//! Queries every enabled retailer for the same search text, isolates per-source
//! failures, and merges the offers into unified products keyed by normalized
//! name. Each call aggregates from scratch; nothing is shared between calls.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ConfigError;
use crate::scrapers::{DetailedOffer, PriceSource, RawOffer, SourceId};
use crate::services::normalizer::NameNormalizer;
use crate::services::price_stats::{PriceObservation, PriceStatistics};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Parallel,
    /// One source after another; deterministic and friendly to restricted runtimes
    Sequential,
}

impl FromStr for AggregationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(AggregationMode::Parallel),
            "sequential" => Ok(AggregationMode::Sequential),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Parallel => f.write_str("parallel"),
            AggregationMode::Sequential => f.write_str("sequential"),
        }
    }
}

/// One product as seen across all sources in a single aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedProduct {
    pub name: String,
    /// Normalized merge key
    pub key: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    offers: Vec<PriceObservation>,
    #[serde(flatten)]
    statistics: PriceStatistics,
}

impl AggregatedProduct {
    /// Descriptive fields come from the first offer and are never overwritten.
    pub fn from_offer(key: String, offer: &RawOffer) -> Self {
        let mut product = Self {
            name: offer.name.clone(),
            key,
            description: offer.description.clone(),
            image_url: offer.image_url.clone(),
            category: offer.category.clone(),
            offers: Vec::new(),
            statistics: PriceStatistics::default(),
        };
        product.add_offer(offer);
        product
    }

    /// Append a price point and recompute statistics from the full offer list.
    pub fn add_offer(&mut self, offer: &RawOffer) {
        self.offers.push(PriceObservation::from(offer));
        self.statistics = PriceStatistics::from_observations(&self.offers);
    }

    pub fn offers(&self) -> &[PriceObservation] {
        &self.offers
    }

    pub fn statistics(&self) -> &PriceStatistics {
        &self.statistics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Completed,
    TimedOut,
    Failed,
}

/// What one source contributed to an aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: SourceId,
    pub status: SourceStatus,
    pub offers: Vec<RawOffer>,
    pub elapsed_ms: u64,
}

impl SourceReport {
    fn empty(source: SourceId, status: SourceStatus, elapsed: Duration) -> Self {
        Self {
            source,
            status,
            offers: Vec::new(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Budget for one source's whole search, retries included
    pub task_timeout: Duration,
    pub default_max_results: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(30),
            default_max_results: 5,
        }
    }
}

pub struct PriceAggregator {
    /// Enabled sources in configuration order
    sources: Vec<Arc<dyn PriceSource>>,
    normalizer: NameNormalizer,
    config: AggregatorConfig,
}

impl PriceAggregator {
    pub fn new(
        sources: Vec<Arc<dyn PriceSource>>,
        normalizer: NameNormalizer,
        config: AggregatorConfig,
    ) -> Result<Self, ConfigError> {
        if config.default_max_results == 0 {
            return Err(ConfigError::InvalidMaxResults(0));
        }

        let mut enabled: Vec<Arc<dyn PriceSource>> = Vec::with_capacity(sources.len());
        for source in sources {
            let id = source.source_id();
            if enabled.iter().any(|s| s.source_id() == id) {
                warn!("Source {} configured twice, keeping the first adapter", id);
                continue;
            }
            enabled.push(source);
        }

        if enabled.is_empty() {
            return Err(ConfigError::NoSources);
        }

        info!(
            "Price aggregator initialized with sources: {:?}",
            enabled.iter().map(|s| s.source_id().as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            sources: enabled,
            normalizer,
            config,
        })
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.source_id()).collect()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn source(&self, id: SourceId) -> Result<Arc<dyn PriceSource>, ConfigError> {
        self.sources
            .iter()
            .find(|s| s.source_id() == id)
            .cloned()
            .ok_or(ConfigError::SourceNotEnabled(id))
    }

    /// Requested sources in configuration order; all of them when `None`.
    fn select(&self, requested: Option<&[SourceId]>) -> Result<Vec<Arc<dyn PriceSource>>, ConfigError> {
        let Some(requested) = requested else {
            return Ok(self.sources.clone());
        };

        for id in requested {
            self.source(*id)?;
        }

        let selected: Vec<_> = self
            .sources
            .iter()
            .filter(|s| requested.contains(&s.source_id()))
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(selected)
    }

    /// Run the selected sources and return what each one produced.
    ///
    /// Validation happens before anything is dispatched; after that the call
    /// cannot fail. A source that times out or panics contributes nothing.
    pub async fn collect(
        &self,
        query: &str,
        max_per_source: usize,
        mode: AggregationMode,
        sources: Option<&[SourceId]>,
    ) -> Result<Vec<SourceReport>, ConfigError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if max_per_source == 0 {
            return Err(ConfigError::InvalidMaxResults(max_per_source));
        }
        let selected = self.select(sources)?;

        info!(
            "Starting {} search for '{}' across {} sources",
            mode,
            query,
            selected.len()
        );

        let timeout = self.config.task_timeout;
        let spawn_search = |source: Arc<dyn PriceSource>| {
            let query = query.to_string();
            tokio::spawn(async move { run_source(source, &query, max_per_source, timeout).await })
        };

        let mut reports = Vec::with_capacity(selected.len());
        match mode {
            AggregationMode::Parallel => {
                let (ids, handles): (Vec<SourceId>, Vec<_>) = selected
                    .into_iter()
                    .map(|source| (source.source_id(), spawn_search(source)))
                    .unzip();

                for (id, joined) in ids.into_iter().zip(join_all(handles).await) {
                    reports.push(joined.unwrap_or_else(|e| {
                        error!("[{}] Search task failed: {}", id, e);
                        SourceReport::empty(id, SourceStatus::Failed, Duration::ZERO)
                    }));
                }
            }
            AggregationMode::Sequential => {
                for source in selected {
                    let id = source.source_id();
                    let report = spawn_search(source).await.unwrap_or_else(|e| {
                        error!("[{}] Search task failed: {}", id, e);
                        SourceReport::empty(id, SourceStatus::Failed, Duration::ZERO)
                    });
                    reports.push(report);
                }
            }
        }

        Ok(reports)
    }

    /// Search all enabled sources and merge their offers.
    pub async fn aggregate(
        &self,
        query: &str,
        max_per_source: usize,
        mode: AggregationMode,
    ) -> Result<Vec<AggregatedProduct>, ConfigError> {
        let reports = self.collect(query, max_per_source, mode, None).await?;
        Ok(self.merge(&reports))
    }

    /// Same as [`aggregate`](Self::aggregate) restricted to some enabled sources.
    pub async fn aggregate_sources(
        &self,
        query: &str,
        max_per_source: usize,
        mode: AggregationMode,
        sources: &[SourceId],
    ) -> Result<Vec<AggregatedProduct>, ConfigError> {
        let reports = self.collect(query, max_per_source, mode, Some(sources)).await?;
        Ok(self.merge(&reports))
    }

    /// The product with the most price points for a query, if any.
    pub async fn best_match(&self, query: &str) -> Result<Option<AggregatedProduct>, ConfigError> {
        let products = self
            .aggregate(query, self.config.default_max_results, AggregationMode::Parallel)
            .await?;
        Ok(products.into_iter().next())
    }

    /// Product page lookup on one source, bounded by the task timeout.
    pub async fn fetch_details(
        &self,
        source: SourceId,
        product_url: &str,
    ) -> Result<Option<DetailedOffer>, ConfigError> {
        let adapter = self.source(source)?;
        match tokio::time::timeout(self.config.task_timeout, adapter.fetch_details(product_url)).await {
            Ok(detail) => Ok(detail.filter(|d| !d.offer.name.trim().is_empty())),
            Err(_) => {
                warn!("[{}] Timed out fetching details for {}", source, product_url);
                Ok(None)
            }
        }
    }

    pub fn merge(&self, reports: &[SourceReport]) -> Vec<AggregatedProduct> {
        merge_offers(&self.normalizer, reports.iter().flat_map(|r| r.offers.iter()))
    }
}

async fn run_source(
    source: Arc<dyn PriceSource>,
    query: &str,
    max_results: usize,
    timeout: Duration,
) -> SourceReport {
    let id = source.source_id();
    let started = Instant::now();

    match tokio::time::timeout(timeout, source.search(query, max_results)).await {
        Ok(mut offers) => {
            offers.retain(|offer| !offer.name.trim().is_empty());
            offers.truncate(max_results);
            info!("[{}] Returned {} offers for '{}'", id, offers.len(), query);
            SourceReport {
                source: id,
                status: SourceStatus::Completed,
                offers,
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
        }
        Err(_) => {
            warn!("[{}] Timed out after {:?} searching for '{}'", id, timeout, query);
            SourceReport::empty(id, SourceStatus::TimedOut, started.elapsed())
        }
    }
}

/// Group offers by normalized name, most price points first.
///
/// Ties keep discovery order.
pub fn merge_offers<'a, I>(normalizer: &NameNormalizer, offers: I) -> Vec<AggregatedProduct>
where
    I: IntoIterator<Item = &'a RawOffer>,
{
    let mut products: Vec<AggregatedProduct> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut offer_count = 0usize;

    for offer in offers {
        offer_count += 1;
        let key = normalizer.normalize(&offer.name);
        if key.is_empty() {
            debug!("[{}] Skipping offer with no usable name: {:?}", offer.source, offer.name);
            continue;
        }

        match by_key.get(&key) {
            Some(&index) => products[index].add_offer(offer),
            None => {
                by_key.insert(key.clone(), products.len());
                products.push(AggregatedProduct::from_offer(key, offer));
            }
        }
    }

    products.sort_by(|a, b| b.offers.len().cmp(&a.offers.len()));

    info!(
        "Aggregated {} unique products from {} offers",
        products.len(),
        offer_count
    );
    products
}
