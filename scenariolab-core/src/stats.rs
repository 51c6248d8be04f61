//! Shared numeric helpers — pure functions over return series.
//!
//! Drawdown convention: every drawdown in this workspace is measured on the
//! cumulative *sum* of returns, starting from a zero baseline, and reported as
//! a non-negative absolute figure in return units (a fraction of starting
//! capital, not of the running peak). Strategy-level and risk-level drawdowns
//! share this single implementation.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample variance (divides by n - 1); 0.0 below two observations.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample covariance over the overlapping prefix of two series.
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let ma = mean(a);
    let mb = mean(b);
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Running cumulative sum.
pub fn cumulative_sum(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(*acc)
        })
        .collect()
}

/// Simple returns `(p[i] - p[i-1]) / p[i-1]` of a price path.
///
/// A non-positive previous price contributes a zero return.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Maximum peak-to-trough decline of the cumulative return sum.
///
/// The running peak starts at the zero baseline, so a series whose first
/// return is a loss already registers a drawdown. Returns 0.0 for empty or
/// monotonically non-decreasing cumulative series.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut cumulative = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for &r in returns {
        cumulative += r;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = peak - cumulative;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}
