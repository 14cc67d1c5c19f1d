#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;

use pricecompare_backend::scrapers::{
    DetailedOffer, JitterRange, PriceSource, RawOffer, ScraperConfig, SourceId,
};
use pricecompare_backend::services::aggregator::AggregatorConfig;

/// How a [`StaticSource`] answers a search
pub enum Behavior {
    Offers(Vec<RawOffer>),
    Slow(Duration, Vec<RawOffer>),
    Panic,
}

/// In-memory retailer used in place of a live site.
pub struct StaticSource {
    id: SourceId,
    behavior: Behavior,
    detail: Option<DetailedOffer>,
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl StaticSource {
    pub fn new(id: SourceId, offers: Vec<RawOffer>) -> Self {
        Self::with_behavior(id, Behavior::Offers(offers))
    }

    pub fn slow(id: SourceId, delay: Duration, offers: Vec<RawOffer>) -> Self {
        Self::with_behavior(id, Behavior::Slow(delay, offers))
    }

    pub fn panicking(id: SourceId) -> Self {
        Self::with_behavior(id, Behavior::Panic)
    }

    pub fn with_behavior(id: SourceId, behavior: Behavior) -> Self {
        Self {
            id,
            behavior,
            detail: None,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn with_detail(mut self, detail: DetailedOffer) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for StaticSource {
    fn source_id(&self) -> SourceId {
        self.id
    }

    async fn search(&self, query: &str, _max_results: usize) -> Vec<RawOffer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());

        match &self.behavior {
            Behavior::Offers(offers) => offers.clone(),
            Behavior::Slow(delay, offers) => {
                tokio::time::sleep(*delay).await;
                offers.clone()
            }
            Behavior::Panic => panic!("{} adapter blew up", self.id),
        }
    }

    async fn fetch_details(&self, product_url: &str) -> Option<DetailedOffer> {
        self.detail
            .clone()
            .filter(|d| d.offer.url.as_deref() == Some(product_url))
    }
}

pub fn offer(source: SourceId, name: &str, price: Option<Decimal>) -> RawOffer {
    RawOffer {
        source,
        name: name.to_string(),
        price,
        currency: "ILS".to_string(),
        url: Some(format!(
            "https://{}.example/{}",
            source.as_str(),
            name.to_lowercase().replace(' ', "-")
        )),
        image_url: None,
        description: None,
        category: None,
        availability: true,
        observed_at: Utc::now(),
    }
}

pub fn detailed(offer: RawOffer) -> DetailedOffer {
    DetailedOffer {
        offer,
        sku: Some("SKU-1".to_string()),
        rating: Some(4.5),
        review_count: Some(12),
        old_price: None,
        on_sale: false,
        specs: Default::default(),
    }
}

pub fn as_sources(sources: &[Arc<StaticSource>]) -> Vec<Arc<dyn PriceSource>> {
    sources
        .iter()
        .map(|s| s.clone() as Arc<dyn PriceSource>)
        .collect()
}

pub fn aggregator_config(task_timeout: Duration) -> AggregatorConfig {
    AggregatorConfig {
        task_timeout,
        default_max_results: 5,
    }
}

/// Scraper settings for local fixture servers: no jitter, short backoff
pub fn fast_scraper_config() -> ScraperConfig {
    ScraperConfig {
        request_timeout: Duration::from_secs(5),
        retry_max: 3,
        retry_delay_ms: 10,
        jitter: None,
        ..ScraperConfig::default()
    }
}

pub fn jitter(min_ms: u64, max_ms: u64) -> Option<JitterRange> {
    Some(JitterRange { min_ms, max_ms })
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_fixture_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fixture server");
    let address = listener.local_addr().expect("Fixture server has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fixture server failed");
    });

    format!("http://{}", address)
}
