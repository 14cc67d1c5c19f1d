//! Comparative price statistics for one aggregated product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::scrapers::{RawOffer, SourceId};

/// One source's price point for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub source: SourceId,
    pub price: Option<Decimal>,
    pub currency: String,
    pub availability: bool,
    pub url: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl From<&RawOffer> for PriceObservation {
    fn from(offer: &RawOffer) -> Self {
        Self {
            source: offer.source,
            price: offer.price,
            currency: offer.currency.clone(),
            availability: offer.availability,
            url: offer.url.clone(),
            observed_at: offer.observed_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceStatistics {
    pub lowest_price: Option<Decimal>,
    pub highest_price: Option<Decimal>,
    pub average_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub potential_savings: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub savings_percent: Option<Decimal>,
}

impl PriceStatistics {
    /// Compute statistics over priced, available observations only.
    ///
    /// Min, max and sum are order independent and decimal arithmetic is exact,
    /// so any permutation of the same observations gives the same result.
    pub fn from_observations(observations: &[PriceObservation]) -> Self {
        let prices: Vec<Decimal> = observations
            .iter()
            .filter(|o| o.availability)
            .filter_map(|o| o.price)
            .collect();

        let (Some(min), Some(max)) = (prices.iter().min(), prices.iter().max()) else {
            return Self::default();
        };

        let sum: Decimal = prices.iter().sum();
        let average = sum / Decimal::from(prices.len());

        let lowest = min.round_dp(2);
        let highest = max.round_dp(2);

        let (potential_savings, savings_percent) = if highest > Decimal::ZERO {
            let savings = highest - lowest;
            (
                Some(savings.round_dp(2)),
                Some((savings / highest * dec!(100)).round_dp(1)),
            )
        } else {
            (None, None)
        };

        Self {
            lowest_price: Some(lowest),
            highest_price: Some(highest),
            average_price: Some(average.round_dp(2)),
            potential_savings,
            savings_percent,
        }
    }
}
