//! Scenario inputs, lifecycle record, and run result.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::ScenarioId;
use super::market::MarketCondition;
use super::risk::RiskMetrics;
use super::strategy::TradingStrategy;

/// Malformed scenario parameters. Raised before any simulation runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duration must be at least one day")]
    ZeroDuration,
    #[error("at least one market condition is required")]
    EmptyMarketConditions,
    #[error("market condition for '{symbol}' has invalid price {price} or volatility {volatility}")]
    InvalidCondition {
        symbol: String,
        price: f64,
        volatility: f64,
    },
    #[error("symbol '{0}' appears in more than one market condition")]
    DuplicateSymbol(String),
    #[error("strategy '{strategy}' references symbol '{symbol}' with no market condition")]
    UnknownSymbol { strategy: String, symbol: String },
    #[error("strategy '{strategy}' has invalid {field}: {value}")]
    InvalidStrategy {
        strategy: String,
        field: &'static str,
        value: f64,
    },
}

/// Input bundle supplied at scenario creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParameters {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Simulation length in days.
    #[serde(alias = "duration")]
    pub duration_days: u32,
    pub market_conditions: Vec<MarketCondition>,
    #[serde(default)]
    pub strategies: Vec<TradingStrategy>,
}

impl ScenarioParameters {
    /// Fail fast on anything that would make a run meaningless.
    ///
    /// Strategies referencing a symbol without a market condition are
    /// rejected here rather than silently contributing a zero return.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_days == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        if self.market_conditions.is_empty() {
            return Err(ValidationError::EmptyMarketConditions);
        }

        let mut symbols = HashSet::new();
        for mc in &self.market_conditions {
            if !mc.is_sane() {
                return Err(ValidationError::InvalidCondition {
                    symbol: mc.symbol.clone(),
                    price: mc.price,
                    volatility: mc.volatility,
                });
            }
            if !symbols.insert(mc.symbol.as_str()) {
                return Err(ValidationError::DuplicateSymbol(mc.symbol.clone()));
            }
        }

        for s in &self.strategies {
            if !symbols.contains(s.symbol.as_str()) {
                return Err(ValidationError::UnknownSymbol {
                    strategy: s.id.clone(),
                    symbol: s.symbol.clone(),
                });
            }
            if !(s.entry_price.is_finite() && s.entry_price > 0.0) {
                return Err(ValidationError::InvalidStrategy {
                    strategy: s.id.clone(),
                    field: "entryPrice",
                    value: s.entry_price,
                });
            }
            if !(s.quantity.is_finite() && s.quantity > 0.0) {
                return Err(ValidationError::InvalidStrategy {
                    strategy: s.id.clone(),
                    field: "quantity",
                    value: s.quantity,
                });
            }
            if let Some(exit) = s.exit_price {
                if !(exit.is_finite() && exit > 0.0) {
                    return Err(ValidationError::InvalidStrategy {
                        strategy: s.id.clone(),
                        field: "exitPrice",
                        value: exit,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Lifecycle state of a scenario.
///
/// `Pending → Running → Completed | Failed`. Terminal states only leave
/// through an explicit re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScenarioStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScenarioStatus::Completed | ScenarioStatus::Failed)
    }
}

/// Aggregate outcome of one successful scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub scenario_id: ScenarioId,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub volatility: f64,
    pub win_rate: f64,
    /// `+∞` when no strategy lost money; persisted as `"Infinity"`.
    #[serde(with = "super::unbounded")]
    pub profit_factor: f64,
    pub risk_metrics: RiskMetrics,
    /// Per-strategy returns in declaration order.
    #[serde(default)]
    pub strategy_returns: Vec<f64>,
    pub completed_at: DateTime<Utc>,
}

/// A scenario record: parameters plus lifecycle state and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: ScenarioId,
    pub parameters: ScenarioParameters,
    pub status: ScenarioStatus,
    #[serde(default)]
    pub results: Option<ScenarioResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scenario {
    pub fn new(id: ScenarioId, parameters: ScenarioParameters) -> Self {
        let now = Utc::now();
        Self {
            id,
            parameters,
            status: ScenarioStatus::Pending,
            results: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition(&mut self, status: ScenarioStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
