//! Strategy evaluator — scores declared positions against a simulated path.
//!
//! Every metric is a pure function of the per-strategy return vector. The
//! evaluator also derives the benchmark series used for beta/alpha: each
//! strategy's underlying buy-and-hold return over the simulated horizon.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scenariolab_core::domain::{MarketCondition, TradingStrategy};
use scenariolab_core::stats::{max_drawdown, mean, population_std_dev};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("no simulated prices for symbol '{symbol}' (strategy '{strategy}')")]
    MissingSymbol { strategy: String, symbol: String },
}

/// Aggregate performance of a strategy set on one simulated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyEvaluation {
    pub strategy_returns: Vec<f64>,
    /// Underlying buy-and-hold return per strategy, same order.
    pub benchmark_returns: Vec<f64>,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub volatility: f64,
    pub win_rate: f64,
    #[serde(with = "scenariolab_core::domain::unbounded")]
    pub profit_factor: f64,
}

impl StrategyEvaluation {
    /// Compute all metrics from realized per-strategy returns.
    pub fn from_returns(strategy_returns: Vec<f64>, benchmark_returns: Vec<f64>) -> Self {
        let volatility = population_std_dev(&strategy_returns);
        Self {
            total_return: strategy_returns.iter().sum(),
            max_drawdown: max_drawdown(&strategy_returns),
            sharpe_ratio: sharpe_ratio(&strategy_returns, volatility),
            volatility,
            win_rate: win_rate(&strategy_returns),
            profit_factor: profit_factor(&strategy_returns),
            strategy_returns,
            benchmark_returns,
        }
    }
}

/// Evaluate every strategy against the simulated conditions.
///
/// A strategy without an exit price closes at the final simulated price of
/// its symbol. `conditions` must be time-ascending per symbol (as produced by
/// the market walker).
pub fn evaluate_strategies(
    strategies: &[TradingStrategy],
    conditions: &[MarketCondition],
) -> Result<StrategyEvaluation, EvaluationError> {
    let mut returns = Vec::with_capacity(strategies.len());
    let mut benchmark = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        let (first, last) = price_bounds(conditions, &strategy.symbol).ok_or_else(|| {
            EvaluationError::MissingSymbol {
                strategy: strategy.id.clone(),
                symbol: strategy.symbol.clone(),
            }
        })?;
        let exit = strategy.exit_price.unwrap_or(last);
        returns.push(strategy.return_at(exit));
        benchmark.push(if first > 0.0 { last / first - 1.0 } else { 0.0 });
    }

    Ok(StrategyEvaluation::from_returns(returns, benchmark))
}

/// First and last simulated price of `symbol`.
fn price_bounds(conditions: &[MarketCondition], symbol: &str) -> Option<(f64, f64)> {
    let first = conditions.iter().find(|c| c.symbol == symbol)?;
    let last = conditions.iter().rev().find(|c| c.symbol == symbol)?;
    Some((first.price, last.price))
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of strictly positive returns; 0.0 for an empty set.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// `mean / volatility`, 0.0 when volatility is zero.
pub fn sharpe_ratio(returns: &[f64], volatility: f64) -> f64 {
    if volatility < 1e-15 {
        return 0.0;
    }
    mean(returns) / volatility
}

/// Gross gains over gross losses.
///
/// `f64::INFINITY` whenever there is no negative return, including the
/// empty and all-zero cases.
pub fn profit_factor(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r.abs()).sum();
    if losses == 0.0 {
        return f64::INFINITY;
    }
    gains / losses
}
