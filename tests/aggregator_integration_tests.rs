mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use pricecompare_backend::error::ConfigError;
use pricecompare_backend::scrapers::SourceId;
use pricecompare_backend::services::aggregator::{AggregationMode, PriceAggregator, SourceStatus};
use pricecompare_backend::services::normalizer::NameNormalizer;
use rust_decimal_macros::dec;

use crate::common::{StaticSource, aggregator_config, as_sources, detailed, offer};

fn aggregator(sources: &[Arc<StaticSource>], task_timeout: Duration) -> PriceAggregator {
    PriceAggregator::new(
        as_sources(sources),
        NameNormalizer::default(),
        aggregator_config(task_timeout),
    )
    .expect("aggregator should build")
}

fn galaxy_sources() -> Vec<Arc<StaticSource>> {
    vec![
        Arc::new(StaticSource::new(
            SourceId::Zap,
            vec![offer(SourceId::Zap, "Samsung Galaxy S24 NEW", Some(dec!(3799)))],
        )),
        Arc::new(StaticSource::new(
            SourceId::Ksp,
            vec![
                offer(SourceId::Ksp, "samsung galaxy s24", Some(dec!(3999.99))),
                offer(SourceId::Ksp, "Logitech MX Master 3S", Some(dec!(389))),
            ],
        )),
        Arc::new(StaticSource::new(
            SourceId::Bug,
            vec![offer(SourceId::Bug, "Samsung  Galaxy S24 Original", Some(dec!(4199.49)))],
        )),
    ]
}

/// Same product on three sites merges into one entry with comparative statistics
#[tokio::test]
async fn test_parallel_aggregation_merges_across_sources() {
    let sources = galaxy_sources();
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let products = aggregator
        .aggregate("galaxy s24", 5, AggregationMode::Parallel)
        .await
        .unwrap();

    assert_eq!(products.len(), 2);
    let galaxy = &products[0];
    assert_eq!(galaxy.key, "samsung galaxy s24");
    assert_eq!(galaxy.name, "Samsung Galaxy S24 NEW");
    assert_eq!(galaxy.offers().len(), 3);

    let stats = galaxy.statistics();
    assert_eq!(stats.lowest_price, Some(dec!(3799)));
    assert_eq!(stats.highest_price, Some(dec!(4199.49)));
    assert_eq!(stats.average_price, Some(dec!(3999.49)));
    assert_eq!(stats.potential_savings, Some(dec!(400.49)));

    assert_eq!(products[1].offers().len(), 1);
    assert!(sources.iter().all(|s| s.calls() == 1));
    assert!(sources.iter().all(|s| s.last_query().as_deref() == Some("galaxy s24")));
}

#[tokio::test]
async fn test_sequential_matches_parallel() {
    let sources = galaxy_sources();
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let parallel = aggregator
        .aggregate("galaxy", 5, AggregationMode::Parallel)
        .await
        .unwrap();
    let sequential = aggregator
        .aggregate("galaxy", 5, AggregationMode::Sequential)
        .await
        .unwrap();

    let summary = |products: &[pricecompare_backend::services::aggregator::AggregatedProduct]| {
        products
            .iter()
            .map(|p| (p.key.clone(), p.offers().len(), p.statistics().clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&parallel), summary(&sequential));
}

/// A hung source is cut off at the task timeout and the others still report
#[tokio::test]
async fn test_slow_source_times_out_without_blocking_others() {
    let sources = vec![
        Arc::new(StaticSource::slow(
            SourceId::Zap,
            Duration::from_secs(30),
            vec![offer(SourceId::Zap, "Never Arrives", Some(dec!(1)))],
        )),
        Arc::new(StaticSource::new(
            SourceId::Ksp,
            vec![
                offer(SourceId::Ksp, "Razer Viper", Some(dec!(250))),
                offer(SourceId::Ksp, "Razer Basilisk", Some(dec!(280))),
                offer(SourceId::Ksp, "Razer Orochi", Some(dec!(300))),
            ],
        )),
    ];
    let aggregator = aggregator(&sources, Duration::from_millis(200));

    let started = Instant::now();
    let reports = aggregator
        .collect("viper", 5, AggregationMode::Parallel, None)
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].source, SourceId::Zap);
    assert_eq!(reports[0].status, SourceStatus::TimedOut);
    assert!(reports[0].offers.is_empty());
    assert_eq!(reports[1].status, SourceStatus::Completed);
    assert_eq!(reports[1].offers.len(), 3);

    let products = aggregator.merge(&reports);
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Razer Viper", "Razer Basilisk", "Razer Orochi"]);
}

#[tokio::test]
async fn test_slow_source_times_out_in_sequential_mode() {
    let sources = vec![
        Arc::new(StaticSource::slow(SourceId::Bug, Duration::from_secs(30), vec![])),
        Arc::new(StaticSource::new(
            SourceId::Zap,
            vec![offer(SourceId::Zap, "HDMI Cable", Some(dec!(29.90)))],
        )),
    ];
    let aggregator = aggregator(&sources, Duration::from_millis(200));

    let products = aggregator
        .aggregate("hdmi", 5, AggregationMode::Sequential)
        .await
        .unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].statistics().lowest_price, Some(dec!(29.90)));
}

/// A panicking adapter becomes a failed report instead of taking down the run
#[tokio::test]
async fn test_panicking_source_is_isolated() {
    for mode in [AggregationMode::Parallel, AggregationMode::Sequential] {
        let sources = vec![
            Arc::new(StaticSource::panicking(SourceId::Ksp)),
            Arc::new(StaticSource::new(
                SourceId::Bug,
                vec![
                    offer(SourceId::Bug, "USB Hub", Some(dec!(79))),
                    offer(SourceId::Bug, "USB-C Cable", Some(dec!(29))),
                    offer(SourceId::Bug, "Card Reader", Some(dec!(49))),
                ],
            )),
        ];
        let aggregator = aggregator(&sources, Duration::from_secs(5));

        let reports = aggregator.collect("hub", 5, mode, None).await.unwrap();
        assert_eq!(reports[0].source, SourceId::Ksp);
        assert_eq!(reports[0].status, SourceStatus::Failed);
        assert_eq!(reports[1].status, SourceStatus::Completed);

        let products = aggregator.merge(&reports);
        let mut names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Card Reader", "USB Hub", "USB-C Cable"]);
        assert!(products.iter().all(|p| p.offers()[0].source == SourceId::Bug));
    }
}

#[tokio::test]
async fn test_all_sources_empty_gives_empty_result() {
    let sources = vec![
        Arc::new(StaticSource::new(SourceId::Zap, vec![])),
        Arc::new(StaticSource::new(SourceId::Ksp, vec![])),
    ];
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let products = aggregator
        .aggregate("nothing", 5, AggregationMode::Parallel)
        .await
        .unwrap();
    assert!(products.is_empty());
    assert_eq!(aggregator.best_match("nothing").await.unwrap(), None);
}

/// Products appearing on 1, 3 and 2 sources come back ordered 3, 2, 1
#[tokio::test]
async fn test_products_ordered_by_offer_count() {
    let sources = vec![
        Arc::new(StaticSource::new(
            SourceId::Zap,
            vec![
                offer(SourceId::Zap, "Single", Some(dec!(10))),
                offer(SourceId::Zap, "Triple", Some(dec!(30))),
                offer(SourceId::Zap, "Double", Some(dec!(20))),
            ],
        )),
        Arc::new(StaticSource::new(
            SourceId::Ksp,
            vec![
                offer(SourceId::Ksp, "Triple", Some(dec!(31))),
                offer(SourceId::Ksp, "Double", Some(dec!(21))),
            ],
        )),
        Arc::new(StaticSource::new(
            SourceId::Bug,
            vec![offer(SourceId::Bug, "Triple", Some(dec!(32)))],
        )),
    ];
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let products = aggregator
        .aggregate("anything", 5, AggregationMode::Parallel)
        .await
        .unwrap();
    let counts: Vec<usize> = products.iter().map(|p| p.offers().len()).collect();
    assert_eq!(counts, vec![3, 2, 1]);

    let best = aggregator.best_match("anything").await.unwrap().unwrap();
    assert_eq!(best.name, "Triple");
}

#[tokio::test]
async fn test_results_capped_per_source() {
    let offers = (1..=6)
        .map(|i| offer(SourceId::Zap, &format!("Keyboard {}", i), Some(dec!(100))))
        .collect();
    let sources = vec![Arc::new(StaticSource::new(SourceId::Zap, offers))];
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let reports = aggregator
        .collect("keyboard", 2, AggregationMode::Parallel, None)
        .await
        .unwrap();
    assert_eq!(reports[0].offers.len(), 2);
    assert_eq!(reports[0].offers[0].name, "Keyboard 1");
}

#[tokio::test]
async fn test_nameless_offers_dropped() {
    let sources = vec![Arc::new(StaticSource::new(
        SourceId::Ksp,
        vec![
            offer(SourceId::Ksp, "   ", Some(dec!(5))),
            offer(SourceId::Ksp, "Mouse Pad", Some(dec!(39))),
        ],
    ))];
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let reports = aggregator
        .collect("pad", 5, AggregationMode::Parallel, None)
        .await
        .unwrap();
    assert_eq!(reports[0].offers.len(), 1);
    assert_eq!(reports[0].offers[0].name, "Mouse Pad");
}

#[tokio::test]
async fn test_restricting_to_some_sources() {
    let sources = galaxy_sources();
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let products = aggregator
        .aggregate_sources("galaxy", 5, AggregationMode::Parallel, &[SourceId::Bug, SourceId::Zap])
        .await
        .unwrap();

    assert_eq!(products.len(), 1);
    let offer_sources: Vec<SourceId> = products[0].offers().iter().map(|o| o.source).collect();
    assert_eq!(offer_sources, vec![SourceId::Zap, SourceId::Bug]);
    assert_eq!(sources[1].calls(), 0);
}

/// Misuse is reported before any source is contacted
#[tokio::test]
async fn test_configuration_errors_dispatch_nothing() {
    let sources = vec![
        Arc::new(StaticSource::new(SourceId::Zap, vec![])),
        Arc::new(StaticSource::new(SourceId::Ksp, vec![])),
    ];
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    assert_eq!(
        aggregator.aggregate("   ", 5, AggregationMode::Parallel).await.unwrap_err(),
        ConfigError::EmptyQuery
    );
    assert_eq!(
        aggregator.aggregate("mouse", 0, AggregationMode::Parallel).await.unwrap_err(),
        ConfigError::InvalidMaxResults(0)
    );
    assert_eq!(
        aggregator
            .aggregate_sources("mouse", 5, AggregationMode::Parallel, &[SourceId::Bug])
            .await
            .unwrap_err(),
        ConfigError::SourceNotEnabled(SourceId::Bug)
    );
    assert_eq!(
        aggregator
            .aggregate_sources("mouse", 5, AggregationMode::Parallel, &[])
            .await
            .unwrap_err(),
        ConfigError::NoSources
    );
    assert!(sources.iter().all(|s| s.calls() == 0));
}

#[test]
fn test_aggregator_requires_sources() {
    let result = PriceAggregator::new(
        vec![],
        NameNormalizer::default(),
        aggregator_config(Duration::from_secs(1)),
    );
    assert!(matches!(result, Err(ConfigError::NoSources)));
}

#[tokio::test]
async fn test_duplicate_source_keeps_first_adapter() {
    let first = Arc::new(StaticSource::new(
        SourceId::Zap,
        vec![offer(SourceId::Zap, "First", Some(dec!(1)))],
    ));
    let second = Arc::new(StaticSource::new(
        SourceId::Zap,
        vec![offer(SourceId::Zap, "Second", Some(dec!(2)))],
    ));
    let aggregator = aggregator(&[first.clone(), second.clone()], Duration::from_secs(5));

    assert_eq!(aggregator.source_ids(), vec![SourceId::Zap]);
    let products = aggregator
        .aggregate("x", 5, AggregationMode::Parallel)
        .await
        .unwrap();
    assert_eq!(products[0].name, "First");
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn test_fetch_details() {
    let product = offer(SourceId::Ksp, "Logitech G502", Some(dec!(199)));
    let url = product.url.clone().unwrap();
    let sources = vec![Arc::new(
        StaticSource::new(SourceId::Ksp, vec![]).with_detail(detailed(product)),
    )];
    let aggregator = aggregator(&sources, Duration::from_secs(5));

    let detail = aggregator.fetch_details(SourceId::Ksp, &url).await.unwrap().unwrap();
    assert_eq!(detail.offer.name, "Logitech G502");
    assert_eq!(detail.rating, Some(4.5));

    assert_eq!(
        aggregator.fetch_details(SourceId::Ksp, "https://ksp.example/other").await,
        Ok(None)
    );
    assert_eq!(
        aggregator.fetch_details(SourceId::Zap, &url).await,
        Err(ConfigError::SourceNotEnabled(SourceId::Zap))
    );
}
