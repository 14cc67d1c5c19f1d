// src/lib.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use config::AppConfig;
use services::aggregator::PriceAggregator;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<PriceAggregator>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(aggregator: PriceAggregator, config: AppConfig) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            config: Arc::new(config),
        }
    }
}

pub mod config;
pub mod error;
pub mod scrapers;

pub mod services {
    pub mod aggregator;
    pub mod normalizer;
    pub mod price_stats;
}

pub mod models {
    pub mod common;
    pub mod product;
    pub mod scraper;
}

pub mod handlers {
    mod errors;
    pub mod health;
    pub mod products;
    pub mod scraper;
}

/// Build the HTTP router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(handlers::health::health))
        .route("/api/products/search", get(handlers::products::search_products))
        .route("/api/products/compare", get(handlers::products::compare_product))
        .route("/api/products/details", get(handlers::products::product_details))
        .route("/api/scraper/status", get(handlers::scraper::scraper_status))
        .route("/api/scraper/test", post(handlers::scraper::test_scrapers))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
