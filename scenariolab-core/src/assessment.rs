//! Risk assessment — historical VaR, expected shortfall, drawdown, beta, alpha.
//!
//! Pure and stateless: the caller supplies both the return series and the
//! benchmark series. Nothing in here generates returns of its own.

use std::cmp::Ordering;

use crate::domain::RiskMetrics;
use crate::stats::{max_drawdown, mean, sample_covariance, sample_variance};

/// Daily risk-free proxy for a 2% annual rate.
pub const DEFAULT_RISK_FREE_DAILY: f64 = 0.02 / 365.0;

/// Compute the full [`RiskMetrics`] bundle.
///
/// `returns` is the series under assessment; `market_returns` the benchmark
/// for beta/alpha (only the overlapping prefix is used for beta). Empty
/// `returns` yields all-zero metrics.
pub fn calculate_risk_metrics(
    returns: &[f64],
    market_returns: &[f64],
    risk_free_daily: f64,
) -> RiskMetrics {
    if returns.is_empty() {
        return RiskMetrics::default();
    }

    let sorted = sorted_ascending(returns);
    let var95 = historical_var(&sorted, 0.95);
    let var99 = historical_var(&sorted, 0.99);
    let expected_shortfall = expected_shortfall(&sorted, 0.95).max(var95);
    let beta = beta(returns, market_returns);
    let alpha = alpha(returns, market_returns, beta, risk_free_daily);

    RiskMetrics {
        var95,
        var99,
        expected_shortfall,
        max_drawdown: max_drawdown(returns),
        beta,
        alpha,
    }
}

/// Cutoff index `floor((1 - c) * n)`, kept inside the slice.
fn cutoff_index(n: usize, confidence: f64) -> usize {
    let k = ((1.0 - confidence) * n as f64).floor() as usize;
    k.min(n.saturating_sub(1))
}

fn sorted_ascending(returns: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Historical-simulation VaR as a positive loss magnitude.
///
/// `sorted` must be ascending. A cutoff return that is a gain reports 0.
pub fn historical_var(sorted: &[f64], confidence: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = cutoff_index(sorted.len(), confidence);
    (-sorted[k]).max(0.0)
}

/// Mean of the `k` worst returns (same cutoff as VaR), negated.
///
/// At least one observation is averaged, so small samples degrade to the
/// single worst return rather than an empty mean.
pub fn expected_shortfall(sorted: &[f64], confidence: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = cutoff_index(sorted.len(), confidence).max(1);
    (-mean(&sorted[..k])).max(0.0)
}

/// Sample covariance over sample benchmark variance.
///
/// Returns 0.0 when the overlapping prefix has fewer than two points or the
/// benchmark has no variance.
pub fn beta(returns: &[f64], market_returns: &[f64]) -> f64 {
    let n = returns.len().min(market_returns.len());
    if n < 2 {
        return 0.0;
    }
    let market_var = sample_variance(&market_returns[..n]);
    if market_var < 1e-15 {
        return 0.0;
    }
    sample_covariance(&returns[..n], &market_returns[..n]) / market_var
}

/// Jensen-style alpha: `mean(r) - rf - beta * (mean(m) - rf)`.
pub fn alpha(returns: &[f64], market_returns: &[f64], beta: f64, risk_free_daily: f64) -> f64 {
    let excess_market = if market_returns.is_empty() {
        0.0
    } else {
        mean(market_returns) - risk_free_daily
    };
    mean(returns) - risk_free_daily - beta * excess_market
}
