use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::time::{Duration, sleep};

use super::{JitterRange, ScraperConfig};
use crate::error::FetchError;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51",
];

/// One HTTP session per retailer adapter.
///
/// The connection pool lives as long as the adapter and is released when it
/// is dropped.
pub struct PageClient {
    client: Client,
    retry_max: u32,
    retry_delay_ms: u64,
    jitter: Option<JitterRange>,
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("he-IL,he;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

impl PageClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(random_user_agent())
            .default_headers(browser_headers())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            retry_max: config.retry_max.max(1),
            retry_delay_ms: config.retry_delay_ms,
            jitter: config.jitter,
        })
    }

    async fn pause_before_attempt(&self) {
        if let Some(range) = self.jitter {
            let delay_ms = if range.max_ms > range.min_ms {
                rand::thread_rng().gen_range(range.min_ms..=range.max_ms)
            } else {
                range.min_ms
            };
            sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    /// GET a page body, retrying transport errors and non-success statuses
    /// with exponential backoff.
    pub async fn get_page(&self, url: &str) -> Result<String, FetchError> {
        let mut delay = Duration::from_millis(self.retry_delay_ms);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.pause_before_attempt().await;

            let result = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    response.text().await.map_err(FetchError::from)
                }
                Ok(response) => Err(FetchError::Status {
                    status: response.status(),
                    url: url.to_string(),
                }),
                Err(e) => Err(FetchError::from(e)),
            };

            let error = match result {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            tracing::warn!(
                "Error fetching {} (attempt {}/{}): {}",
                url,
                attempt,
                self.retry_max,
                error
            );

            // No backoff after the final attempt
            if attempt >= self.retry_max {
                return Err(error);
            }
            sleep(delay).await;
            delay *= 2;
        }
    }
}
