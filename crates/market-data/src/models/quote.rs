use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current USD price of an asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: Decimal,
    /// Percent change over the last 24 hours.
    pub change_24h: Decimal,
}

impl PriceQuote {
    pub fn new(price: Decimal, change_24h: Decimal) -> Self {
        Self { price, change_24h }
    }

    /// Percent change from `open` to `last`; zero when `open` is zero.
    pub fn from_open_and_last(open: Decimal, last: Decimal) -> Self {
        let change_24h = if open.is_zero() {
            Decimal::ZERO
        } else {
            ((last - open) / open * Decimal::ONE_HUNDRED).round_dp(4)
        };
        Self {
            price: last,
            change_24h,
        }
    }
}

/// One raw sample from a history endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// Chart series. `prices` and `labels` always have the same length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub prices: Vec<Decimal>,
    pub labels: Vec<String>,
}

impl PriceHistory {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
