use pricecompare_backend::{
    AppState,
    config::AppConfig,
    router,
    scrapers::build_source,
    services::{aggregator::PriceAggregator, normalizer::NameNormalizer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pricecompare_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let sources = config
        .enabled_sources
        .iter()
        .map(|source| build_source(*source, config.scraper.clone()))
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to build HTTP client");

    let aggregator = PriceAggregator::new(
        sources,
        NameNormalizer::new(&config.noise_words),
        config.aggregator.clone(),
    )
    .expect("Failed to initialize price aggregator");

    let address = config.bind_address();
    let app = router(AppState::new(aggregator, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .expect("Failed to bind address");

    tracing::info!("Server listening on {}", address);

    axum::serve(listener, app).await.expect("Server error");
}
