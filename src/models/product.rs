use serde::{Deserialize, Serialize};

use crate::services::aggregator::{AggregatedProduct, AggregationMode};
use crate::services::price_stats::{PriceObservation, PriceStatistics};

/// Products returned by a search unless `limit` says otherwise
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Query parameters for GET /api/products/search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub max_results_per_site: Option<usize>,
    pub mode: Option<String>,       // "parallel" or "sequential"
    pub sources: Option<String>,    // Comma-separated: "zap,ksp"
    pub limit: Option<usize>,
}

/// Query parameters for GET /api/products/compare
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareQuery {
    pub name: Option<String>,
}

/// Query parameters for GET /api/products/details
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsQuery {
    pub source: Option<String>,
    pub url: Option<String>,
}

/// One merged product with its price points from every source
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithPrices {
    /// 1-based position in the result list
    pub id: usize,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub prices: Vec<PriceObservation>,
    #[serde(flatten)]
    pub statistics: PriceStatistics,
}

impl From<(usize, AggregatedProduct)> for ProductWithPrices {
    fn from((id, product): (usize, AggregatedProduct)) -> Self {
        Self {
            id,
            prices: product.offers().to_vec(),
            statistics: product.statistics().clone(),
            name: product.name,
            description: product.description,
            category: product.category,
            image_url: product.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: AggregationMode,
    pub total_results: usize,
    pub products: Vec<ProductWithPrices>,
}
