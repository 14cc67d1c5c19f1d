//! Typed errors.
//!
//! Only configuration misuse ever reaches a caller. Fetch failures are
//! logged inside the scrapers and turned into empty results.

use thiserror::Error;

use crate::scrapers::SourceId;

/// Rejected before any fetch is dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("source {0} is not enabled")]
    SourceNotEnabled(SourceId),

    #[error("no sources configured")]
    NoSources,

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("max results per source must be positive, got {0}")]
    InvalidMaxResults(usize),

    #[error("unknown aggregation mode: {0}")]
    UnknownMode(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Failure of a single page fetch. Never leaves the scraper that produced it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
