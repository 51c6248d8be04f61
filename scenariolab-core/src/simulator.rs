//! Market simulator — GBM, jump-diffusion, and the hourly multi-asset walker.
//!
//! All functions take the random source explicitly. With zero volatility the
//! stochastic term vanishes and every path is the deterministic drift path.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::MarketCondition;
use crate::rng::RandomSource;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("steps must be at least 1")]
    ZeroSteps,
    #[error("time horizon must be positive, got {0}")]
    NonPositiveHorizon(f64),
    #[error("duration must be at least one day")]
    ZeroDuration,
    #[error("no initial market conditions supplied")]
    EmptyConditions,
}

fn check_grid(time_horizon: f64, steps: usize) -> Result<f64, SimulationError> {
    if steps == 0 {
        return Err(SimulationError::ZeroSteps);
    }
    if !(time_horizon > 0.0) || !time_horizon.is_finite() {
        return Err(SimulationError::NonPositiveHorizon(time_horizon));
    }
    Ok(time_horizon / steps as f64)
}

/// One exact log-normal GBM step.
#[inline]
fn gbm_step<R: RandomSource + ?Sized>(
    price: f64,
    drift: f64,
    volatility: f64,
    dt: f64,
    rng: &mut R,
) -> f64 {
    let z = rng.standard_normal();
    price * ((drift - 0.5 * volatility * volatility) * dt + volatility * dt.sqrt() * z).exp()
}

/// Geometric Brownian Motion path of `steps + 1` prices, starting at `initial_price`.
///
/// `P[i] = P[i-1] * exp((drift - σ²/2)·dt + σ·√dt·Z)` with `dt = time_horizon / steps`.
pub fn simulate_geometric_brownian_motion<R: RandomSource + ?Sized>(
    initial_price: f64,
    drift: f64,
    volatility: f64,
    time_horizon: f64,
    steps: usize,
    rng: &mut R,
) -> Result<Vec<f64>, SimulationError> {
    let dt = check_grid(time_horizon, steps)?;

    let mut path = Vec::with_capacity(steps + 1);
    path.push(initial_price);
    let mut price = initial_price;
    for _ in 0..steps {
        price = gbm_step(price, drift, volatility, dt, rng);
        path.push(price);
    }
    Ok(path)
}

/// GBM plus discrete jumps.
///
/// Each step independently jumps with probability `jump_intensity · dt`
/// (a Bernoulli approximation of a Poisson arrival); a jump adds a
/// `Normal(jump_mean, jump_std)` log-return on top of the diffusion step.
#[allow(clippy::too_many_arguments)]
pub fn simulate_jump_diffusion<R: RandomSource + ?Sized>(
    initial_price: f64,
    drift: f64,
    volatility: f64,
    jump_intensity: f64,
    jump_mean: f64,
    jump_std: f64,
    time_horizon: f64,
    steps: usize,
    rng: &mut R,
) -> Result<Vec<f64>, SimulationError> {
    let dt = check_grid(time_horizon, steps)?;
    let jump_probability = jump_intensity * dt;

    let mut path = Vec::with_capacity(steps + 1);
    path.push(initial_price);
    let mut price = initial_price;
    for _ in 0..steps {
        price = gbm_step(price, drift, volatility, dt, rng);
        if rng.bernoulli(jump_probability) {
            price *= rng.normal(jump_mean, jump_std).exp();
        }
        path.push(price);
    }
    Ok(path)
}

/// Constants of the hourly market-condition walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkParams {
    /// Annual drift applied to every symbol.
    pub annual_drift: f64,
    pub hours_per_day: u32,
    pub days_per_year: f64,
    /// Prices never fall below this floor.
    pub price_floor: f64,
    /// Half-width of the uniform multiplicative volume perturbation.
    pub volume_jitter: f64,
    /// Half-width of the uniform multiplicative volatility perturbation.
    pub volatility_jitter: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            annual_drift: 0.05,
            hours_per_day: 24,
            days_per_year: 365.0,
            price_floor: 0.01,
            volume_jitter: 0.10,
            volatility_jitter: 0.05,
        }
    }
}

/// Walk every symbol forward hour by hour.
///
/// For each symbol (input order) the output holds the initial snapshot
/// followed by `duration_days × hours_per_day` hourly points: symbol-major,
/// time-ascending within a symbol. Each step advances price with the GBM
/// recursion at the symbol's current volatility, then perturbs volume and
/// volatility multiplicatively.
pub fn simulate_market_conditions<R: RandomSource + ?Sized>(
    initial_conditions: &[MarketCondition],
    duration_days: u32,
    params: &WalkParams,
    rng: &mut R,
) -> Result<Vec<MarketCondition>, SimulationError> {
    if duration_days == 0 {
        return Err(SimulationError::ZeroDuration);
    }
    if initial_conditions.is_empty() {
        return Err(SimulationError::EmptyConditions);
    }

    let steps = duration_days as usize * params.hours_per_day.max(1) as usize;
    let dt = 1.0 / (params.days_per_year * params.hours_per_day.max(1) as f64);
    tracing::debug!(
        symbols = initial_conditions.len(),
        steps,
        "walking market conditions"
    );

    let mut out = Vec::with_capacity(initial_conditions.len() * (steps + 1));
    for initial in initial_conditions {
        let mut current = initial.clone();
        out.push(current.clone());

        for _ in 0..steps {
            let next_price = gbm_step(
                current.price,
                params.annual_drift,
                current.volatility,
                dt,
                rng,
            )
            .max(params.price_floor);

            let volume_factor =
                1.0 + rng.uniform_range(-params.volume_jitter, params.volume_jitter);
            let vol_factor =
                1.0 + rng.uniform_range(-params.volatility_jitter, params.volatility_jitter);

            current = MarketCondition {
                symbol: current.symbol.clone(),
                price: next_price,
                volatility: (current.volatility * vol_factor).max(0.0),
                volume: (current.volume as f64 * volume_factor).round().max(0.0) as u64,
                timestamp: current.timestamp + Duration::hours(1),
            };
            out.push(current.clone());
        }
    }
    Ok(out)
}

/// Last simulated condition for `symbol`, if any.
pub fn final_condition<'a>(
    conditions: &'a [MarketCondition],
    symbol: &str,
) -> Option<&'a MarketCondition> {
    conditions.iter().rev().find(|c| c.symbol == symbol)
}

/// Stochastic model selector for direct path simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum SimulationModel {
    Gbm {
        initial_price: f64,
        drift: f64,
        volatility: f64,
        time_horizon: f64,
        steps: usize,
    },
    JumpDiffusion {
        initial_price: f64,
        drift: f64,
        volatility: f64,
        jump_intensity: f64,
        jump_mean: f64,
        jump_std: f64,
        time_horizon: f64,
        steps: usize,
    },
}

impl SimulationModel {
    pub fn simulate<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<f64>, SimulationError> {
        match *self {
            SimulationModel::Gbm {
                initial_price,
                drift,
                volatility,
                time_horizon,
                steps,
            } => simulate_geometric_brownian_motion(
                initial_price,
                drift,
                volatility,
                time_horizon,
                steps,
                rng,
            ),
            SimulationModel::JumpDiffusion {
                initial_price,
                drift,
                volatility,
                jump_intensity,
                jump_mean,
                jump_std,
                time_horizon,
                steps,
            } => simulate_jump_diffusion(
                initial_price,
                drift,
                volatility,
                jump_intensity,
                jump_mean,
                jump_std,
                time_horizon,
                steps,
                rng,
            ),
        }
    }
}
