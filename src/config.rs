use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::scrapers::{JitterRange, ScraperConfig, SourceId};
use crate::services::aggregator::AggregatorConfig;
use crate::services::normalizer::DEFAULT_NOISE_WORDS;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub enabled_sources: Vec<SourceId>,
    pub noise_words: Vec<String>,
    pub scraper: ScraperConfig,
    pub aggregator: AggregatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            enabled_sources: SourceId::ALL.to_vec(),
            noise_words: DEFAULT_NOISE_WORDS.iter().map(|w| w.to_string()).collect(),
            scraper: ScraperConfig::default(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse_value("PORT", &port)?;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }
        if let Some(sources) = get("ENABLED_SOURCES") {
            config.enabled_sources = SourceId::parse_list(&sources)?;
            if config.enabled_sources.is_empty() {
                return Err(ConfigError::NoSources);
            }
        }
        if let Some(words) = get("NOISE_WORDS") {
            config.noise_words = split_list(&words);
        }

        let scraper = &mut config.scraper;
        if let Some(currency) = get("CURRENCY") {
            scraper.currency = currency;
        }
        if let Some(secs) = get("SCRAPER_REQUEST_TIMEOUT_SECS") {
            scraper.request_timeout = Duration::from_secs(parse_positive("SCRAPER_REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(retries) = get("SCRAPER_RETRY_MAX") {
            scraper.retry_max = parse_positive("SCRAPER_RETRY_MAX", &retries)?;
        }
        if let Some(delay) = get("SCRAPER_RETRY_DELAY_MS") {
            scraper.retry_delay_ms = parse_value("SCRAPER_RETRY_DELAY_MS", &delay)?;
        }
        if let Some(phrases) = get("OUT_OF_STOCK_PHRASES") {
            scraper.out_of_stock_phrases = split_list(&phrases);
        }

        let jitter_enabled = match get("SCRAPER_JITTER_ENABLED") {
            Some(value) => parse_bool("SCRAPER_JITTER_ENABLED", &value)?,
            None => true,
        };
        scraper.jitter = if jitter_enabled {
            let defaults = scraper.jitter.unwrap_or(JitterRange { min_ms: 1000, max_ms: 3000 });
            let min_ms = match get("SCRAPER_JITTER_MIN_MS") {
                Some(v) => parse_value("SCRAPER_JITTER_MIN_MS", &v)?,
                None => defaults.min_ms,
            };
            let max_ms = match get("SCRAPER_JITTER_MAX_MS") {
                Some(v) => parse_value("SCRAPER_JITTER_MAX_MS", &v)?,
                None => defaults.max_ms,
            };
            if min_ms > max_ms {
                return Err(ConfigError::InvalidValue {
                    key: "SCRAPER_JITTER_MIN_MS".to_string(),
                    value: format!("{} exceeds SCRAPER_JITTER_MAX_MS {}", min_ms, max_ms),
                });
            }
            Some(JitterRange { min_ms, max_ms })
        } else {
            None
        };

        if let Some(secs) = get("AGGREGATOR_TASK_TIMEOUT_SECS") {
            config.aggregator.task_timeout =
                Duration::from_secs(parse_positive("AGGREGATOR_TASK_TIMEOUT_SECS", &secs)?);
        }
        if let Some(max) = get("DEFAULT_MAX_RESULTS") {
            config.aggregator.default_max_results = parse_positive("DEFAULT_MAX_RESULTS", &max)?;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

/// Unsigned value that must be non-zero; out-of-range input is rejected.
fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    let parsed: T = parse_value(key, value)?;
    if parsed == T::default() {
        return Err(invalid(key, value));
    }
    Ok(parsed)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
