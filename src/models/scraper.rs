use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scrapers::{RawOffer, SourceId};
use crate::services::aggregator::SourceStatus;

/// Response for GET /api/scraper/status
#[derive(Debug, Clone, Serialize)]
pub struct ScraperStatusResponse {
    pub enabled_sources: Vec<SourceId>,
    pub currency: String,
    pub request_timeout_secs: u64,
    pub retry_max: u32,
    pub retry_delay_ms: u64,
    pub jitter_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_min_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_max_ms: Option<u64>,
    pub task_timeout_secs: u64,
    pub default_max_results: usize,
    pub out_of_stock_phrases: Vec<String>,
}

/// Query parameters for POST /api/scraper/test
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScraperTestQuery {
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceTestResult {
    pub status: SourceStatus,
    pub count: usize,
    pub elapsed_ms: u64,
    pub products: Vec<RawOffer>,   // Top 3
}

#[derive(Debug, Clone, Serialize)]
pub struct ScraperTestResponse {
    pub query: String,
    pub results: BTreeMap<SourceId, SourceTestResult>,
    pub total_products: usize,
}
