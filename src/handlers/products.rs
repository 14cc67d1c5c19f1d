use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use super::errors::{ApiError, bad_request, not_found};
use crate::{
    AppState,
    error::ConfigError,
    models::product::{
        CompareQuery, DEFAULT_SEARCH_LIMIT, DetailsQuery, ProductWithPrices, SearchQuery,
        SearchResponse,
    },
    scrapers::{DetailedOffer, SourceId},
    services::aggregator::AggregationMode,
};

/// Handler for GET /api/products/search
/// Scrapes every requested source and returns merged products, most offers first
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<(StatusCode, Json<SearchResponse>), ApiError> {
    tracing::info!("Product search with params: {:?}", params);

    let query = params.query.as_deref().unwrap_or_default().trim().to_string();
    let max_results = params
        .max_results_per_site
        .unwrap_or(state.aggregator.config().default_max_results);
    let mode: AggregationMode = match params.mode.as_deref() {
        Some(mode) => mode.parse().map_err(bad_request)?,
        None => AggregationMode::default(),
    };
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if limit == 0 {
        return Err(bad_request(ConfigError::InvalidValue {
            key: "limit".to_string(),
            value: "0".to_string(),
        }));
    }

    let products = match params.sources.as_deref() {
        Some(list) => {
            let sources = SourceId::parse_list(list).map_err(bad_request)?;
            if sources.is_empty() {
                return Err(bad_request(ConfigError::NoSources));
            }
            state
                .aggregator
                .aggregate_sources(&query, max_results, mode, &sources)
                .await
        }
        None => state.aggregator.aggregate(&query, max_results, mode).await,
    }
    .map_err(bad_request)?;

    let products: Vec<ProductWithPrices> = products
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, product)| ProductWithPrices::from((index + 1, product)))
        .collect();

    tracing::info!("Search for '{}' returned {} products", query, products.len());

    Ok((
        StatusCode::OK,
        Json(SearchResponse {
            query,
            mode,
            total_results: products.len(),
            products,
        }),
    ))
}

/// Handler for GET /api/products/compare
pub async fn compare_product(
    State(state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> Result<(StatusCode, Json<ProductWithPrices>), ApiError> {
    let name = params.name.unwrap_or_default();

    match state.aggregator.best_match(&name).await.map_err(bad_request)? {
        Some(product) => Ok((StatusCode::OK, Json(ProductWithPrices::from((1, product))))),
        None => Err(not_found(format!("No offers found for '{}'", name.trim()))),
    }
}

/// Handler for GET /api/products/details
pub async fn product_details(
    State(state): State<AppState>,
    Query(params): Query<DetailsQuery>,
) -> Result<(StatusCode, Json<DetailedOffer>), ApiError> {
    let source: SourceId = params
        .source
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(bad_request)?;
    let url = params.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(bad_request(ConfigError::InvalidValue {
            key: "url".to_string(),
            value: url,
        }));
    }

    match state
        .aggregator
        .fetch_details(source, url.trim())
        .await
        .map_err(bad_request)?
    {
        Some(detail) => Ok((StatusCode::OK, Json(detail))),
        None => Err(not_found(format!("No product details found at {}", url.trim()))),
    }
}
