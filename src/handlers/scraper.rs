use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use super::errors::{ApiError, bad_request};
use crate::{
    AppState,
    models::scraper::{ScraperStatusResponse, ScraperTestQuery, ScraperTestResponse, SourceTestResult},
    services::aggregator::AggregationMode,
};

const TEST_QUERY: &str = "mouse";
const TEST_MAX_RESULTS: usize = 3;

/// Handler for GET /api/scraper/status
pub async fn scraper_status(State(state): State<AppState>) -> Json<ScraperStatusResponse> {
    let scraper = &state.config.scraper;
    let aggregator = state.aggregator.config();

    Json(ScraperStatusResponse {
        enabled_sources: state.aggregator.source_ids(),
        currency: scraper.currency.clone(),
        request_timeout_secs: scraper.request_timeout.as_secs(),
        retry_max: scraper.retry_max,
        retry_delay_ms: scraper.retry_delay_ms,
        jitter_enabled: scraper.jitter.is_some(),
        jitter_min_ms: scraper.jitter.map(|j| j.min_ms),
        jitter_max_ms: scraper.jitter.map(|j| j.max_ms),
        task_timeout_secs: aggregator.task_timeout.as_secs(),
        default_max_results: aggregator.default_max_results,
        out_of_stock_phrases: scraper.out_of_stock_phrases.clone(),
    })
}

/// Handler for POST /api/scraper/test
/// Runs a small live search on every enabled source and reports each one separately
pub async fn test_scrapers(
    State(state): State<AppState>,
    Query(params): Query<ScraperTestQuery>,
) -> Result<(StatusCode, Json<ScraperTestResponse>), ApiError> {
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| TEST_QUERY.to_string());

    let reports = state
        .aggregator
        .collect(&query, TEST_MAX_RESULTS, AggregationMode::Parallel, None)
        .await
        .map_err(bad_request)?;

    let total_products = reports.iter().map(|r| r.offers.len()).sum();
    let results: BTreeMap<_, _> = reports
        .into_iter()
        .map(|report| {
            let count = report.offers.len();
            let mut products = report.offers;
            products.truncate(TEST_MAX_RESULTS);
            (
                report.source,
                SourceTestResult {
                    status: report.status,
                    count,
                    elapsed_ms: report.elapsed_ms,
                    products,
                },
            )
        })
        .collect();

    tracing::info!("Scraper test for '{}' found {} offers", query, total_products);

    Ok((
        StatusCode::OK,
        Json(ScraperTestResponse {
            query,
            results,
            total_products,
        }),
    ))
}
