//! MarketCondition — a point-in-time snapshot of one tradable symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price, annualized volatility and volume for one symbol at one instant.
///
/// Produced by the market simulator, consumed by the strategy evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCondition {
    pub symbol: String,
    pub price: f64,
    pub volatility: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

impl MarketCondition {
    pub fn new(symbol: impl Into<String>, price: f64, volatility: f64, volume: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volatility,
            volume,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Price must be finite and positive, volatility finite and non-negative.
    pub fn is_sane(&self) -> bool {
        self.price.is_finite()
            && self.price > 0.0
            && self.volatility.is_finite()
            && self.volatility >= 0.0
    }
}
