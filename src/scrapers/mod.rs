pub mod bug;
pub mod extract;
pub mod http;
pub mod ksp;
pub mod parser;
pub mod site;
pub mod zap;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FetchError};
use site::HtmlScraper;

/// Closed set of retailers the backend knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceId {
    #[serde(rename = "Zap", alias = "zap")]
    Zap,
    #[serde(rename = "KSP", alias = "ksp")]
    Ksp,
    #[serde(rename = "Bug", alias = "bug")]
    Bug,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Zap, SourceId::Ksp, SourceId::Bug];

    /// Lowercase identifier used in configuration and query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Zap => "zap",
            SourceId::Ksp => "ksp",
            SourceId::Bug => "bug",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Zap => "Zap",
            SourceId::Ksp => "KSP",
            SourceId::Bug => "Bug",
        }
    }

    /// Parse a comma-separated list such as `"zap, ksp"`.
    pub fn parse_list(value: &str) -> Result<Vec<SourceId>, ConfigError> {
        let mut sources = Vec::new();
        for part in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let source: SourceId = part.parse()?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(sources)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SourceId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zap" => Ok(SourceId::Zap),
            "ksp" => Ok(SourceId::Ksp),
            "bug" => Ok(SourceId::Bug),
            _ => Err(ConfigError::UnknownSource(s.to_string())),
        }
    }
}

/// One source's view of one product at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOffer {
    pub source: SourceId,
    pub name: String,
    pub price: Option<Decimal>,
    pub currency: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub availability: bool,
    pub observed_at: DateTime<Utc>,
}

/// Product page result: the offer plus fields only a detail page carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedOffer {
    #[serde(flatten)]
    pub offer: RawOffer,
    pub sku: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub old_price: Option<Decimal>,
    pub on_sale: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub specs: BTreeMap<String, String>,
}

/// Random pause before each request attempt, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub request_timeout: Duration,
    pub retry_max: u32,
    pub retry_delay_ms: u64,
    /// `None` disables the pre-request pause (tests, trusted mirrors)
    pub jitter: Option<JitterRange>,
    pub currency: String,
    pub out_of_stock_phrases: Vec<String>,
}

pub const DEFAULT_OUT_OF_STOCK_PHRASES: &[&str] = &[
    "out of stock",
    "sold out",
    "אזל",
    "אזל מהמלאי",
    "לא זמין",
    "לא במלאי",
];

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            retry_max: 3,
            retry_delay_ms: 1000,
            jitter: Some(JitterRange {
                min_ms: 1000,
                max_ms: 3000,
            }),
            currency: "ILS".to_string(),
            out_of_stock_phrases: DEFAULT_OUT_OF_STOCK_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Capability every retailer adapter provides to the aggregator.
///
/// Implementations never fail: network and markup problems are logged and
/// show up as fewer (or no) offers.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn source_id(&self) -> SourceId;

    async fn search(&self, query: &str, max_results: usize) -> Vec<RawOffer>;

    async fn fetch_details(&self, product_url: &str) -> Option<DetailedOffer>;
}

/// Build the live HTML adapter for a source.
pub fn build_source(
    source: SourceId,
    config: ScraperConfig,
) -> Result<Arc<dyn PriceSource>, FetchError> {
    let profile = match source {
        SourceId::Zap => zap::profile(),
        SourceId::Ksp => ksp::profile(),
        SourceId::Bug => bug::profile(),
    };
    Ok(Arc::new(HtmlScraper::new(profile, config)?))
}
