//! Stress tester — shocks a reference asset and measures the damage.
//!
//! Each stress scenario perturbs the reference price/volatility according to
//! its type and severity, simulates a bearish GBM path over the stress
//! horizon, and scores the resulting return series.
//!
//! Shock table (m = severity multiplier 0.5 / 1.0 / 2.0):
//! - market_crash: price × (1 − m·crash_factor), vol × (1 + m·vol_factor)
//! - volatility_spike: vol × (1 + m·vol_factor)
//! - interest_rate_change: price × (1 − m·rate_shift·rate_sensitivity)
//! - liquidity_crisis: vol × (1 + m·vol_factor)
//!
//! Defaults: crash_factor 0.3, rate_shift 0.02, rate_sensitivity 10,
//! vol_factor 1.0 / 2.0 / 1.5 (crash / spike / liquidity), drift −0.1,
//! horizon_days 30. Any of them may be overridden through the stress
//! scenario's `parameters` map.

use rayon::prelude::*;
use thiserror::Error;

use scenariolab_core::assessment::calculate_risk_metrics;
use scenariolab_core::domain::{
    ScenarioId, Severity, StressTestResult, StressTestScenario, StressType,
};
use scenariolab_core::rng::{RandomSource, SeedHierarchy};
use scenariolab_core::simulator::{simulate_geometric_brownian_motion, SimulationError};
use scenariolab_core::stats::{cumulative_sum, simple_returns};

use crate::config::{EngineConfig, StressConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StressError {
    #[error("stress '{name}' shocks the reference price to {price}; it must stay positive")]
    NonPositiveShockedPrice { name: String, price: f64 },
    #[error("stress '{name}' has invalid horizon_days {days}")]
    InvalidHorizon { name: String, days: f64 },
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Reference price and volatility after a shock, plus the path parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShockedMarket {
    pub price: f64,
    pub volatility: f64,
    pub drift: f64,
    pub horizon_days: f64,
}

/// Apply the type/severity shock to the reference asset.
pub fn apply_shock(stress: &StressTestScenario, reference: &StressConfig) -> ShockedMarket {
    let m = stress.severity.multiplier();
    let mut price = reference.reference_price;
    let mut volatility = reference.reference_volatility;

    match stress.stress_type {
        StressType::MarketCrash => {
            price *= 1.0 - m * stress.param_or("crash_factor", 0.3);
            volatility *= 1.0 + m * stress.param_or("vol_factor", 1.0);
        }
        StressType::VolatilitySpike => {
            volatility *= 1.0 + m * stress.param_or("vol_factor", 2.0);
        }
        StressType::InterestRateChange => {
            let shift = stress.param_or("rate_shift", 0.02);
            let sensitivity = stress.param_or("rate_sensitivity", 10.0);
            price *= 1.0 - m * shift * sensitivity;
        }
        StressType::LiquidityCrisis => {
            volatility *= 1.0 + m * stress.param_or("vol_factor", 1.5);
        }
    }

    ShockedMarket {
        price,
        volatility: volatility.max(0.0),
        drift: stress.param_or("drift", -0.1),
        horizon_days: stress.param_or("horizon_days", 30.0),
    }
}

/// Index of the first step where the cumulative return is back at or above
/// zero after having dipped below it.
///
/// The series length when that never happens, including series that never
/// go negative.
pub fn recovery_time(returns: &[f64]) -> usize {
    let mut cumulative = 0.0;
    let mut trough = 0.0;
    for (i, r) in returns.iter().enumerate() {
        cumulative += r;
        if cumulative < trough {
            trough = cumulative;
        } else if trough < 0.0 && cumulative >= 0.0 {
            return i;
        }
    }
    returns.len()
}

/// Minimum cumulative return, measured from a zero baseline.
pub fn max_loss(returns: &[f64]) -> f64 {
    cumulative_sum(returns).into_iter().fold(0.0, f64::min)
}

/// 0–100 resilience score; higher means the portfolio held up better.
pub fn stress_impact_score(total_return: f64, max_loss: f64, var95: f64) -> f64 {
    let components = [
        (50.0 + total_return * 100.0).max(0.0),
        (50.0 + max_loss * 100.0).max(0.0),
        (50.0 - var95 * 100.0).max(0.0),
    ];
    let score = components.iter().sum::<f64>() / components.len() as f64;
    score.clamp(0.0, 100.0)
}

/// Runs stress scenarios against the configured reference asset.
#[derive(Debug, Clone)]
pub struct StressTester {
    reference: StressConfig,
    hours_per_day: u32,
    days_per_year: f64,
    risk_free_daily: f64,
    parallel: bool,
}

impl Default for StressTester {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl StressTester {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            reference: config.stress.clone(),
            hours_per_day: config.simulation.hours_per_day.max(1),
            days_per_year: config.simulation.days_per_year,
            risk_free_daily: config.risk.risk_free_daily(),
            parallel: true,
        }
    }

    /// Enables or disables rayon in [`StressTester::run_suite`].
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run one stress scenario.
    pub fn run<R: RandomSource + ?Sized>(
        &self,
        scenario_id: &ScenarioId,
        stress: &StressTestScenario,
        rng: &mut R,
    ) -> Result<StressTestResult, StressError> {
        let _span = tracing::info_span!(
            "stress_test",
            scenario = %scenario_id,
            stress = %stress.name,
            kind = %stress.stress_type,
            severity = %stress.severity,
        )
        .entered();

        let shocked = apply_shock(stress, &self.reference);
        if !(shocked.price > 0.0) {
            return Err(StressError::NonPositiveShockedPrice {
                name: stress.name.clone(),
                price: shocked.price,
            });
        }
        if !(shocked.horizon_days > 0.0) {
            return Err(StressError::InvalidHorizon {
                name: stress.name.clone(),
                days: shocked.horizon_days,
            });
        }

        let steps = (shocked.horizon_days * self.hours_per_day as f64).round() as usize;
        let path = simulate_geometric_brownian_motion(
            shocked.price,
            shocked.drift,
            shocked.volatility,
            shocked.horizon_days / self.days_per_year,
            steps,
            rng,
        )?;

        let returns = simple_returns(&path);
        let total_return: f64 = returns.iter().sum();
        let max_loss = max_loss(&returns);
        let risk_metrics = calculate_risk_metrics(&returns, &returns, self.risk_free_daily);
        let recovery_time = recovery_time(&returns);
        let score = stress_impact_score(total_return, max_loss, risk_metrics.var95);

        tracing::debug!(steps, total_return, max_loss, score, "stress test finished");

        Ok(StressTestResult {
            scenario_id: scenario_id.clone(),
            stress_scenario: stress.clone(),
            total_return,
            max_loss,
            risk_metrics,
            recovery_time,
            stress_impact_score: score,
        })
    }

    /// Run many stress scenarios, each on its own sub-seeded stream.
    ///
    /// Output order matches input order, and the results are identical
    /// whether or not the suite runs in parallel.
    pub fn run_suite(
        &self,
        scenario_id: &ScenarioId,
        stresses: &[StressTestScenario],
        seeds: &SeedHierarchy,
    ) -> Result<Vec<StressTestResult>, StressError> {
        let run_one = |(idx, stress): (usize, &StressTestScenario)| {
            let mut rng = seeds.source_for(scenario_id.as_str(), &stress.name, idx as u64);
            self.run(scenario_id, stress, &mut rng)
        };

        if self.parallel {
            stresses.par_iter().enumerate().map(run_one).collect()
        } else {
            stresses.iter().enumerate().map(run_one).collect()
        }
    }
}

/// The five built-in stress templates.
pub fn stress_test_templates() -> Vec<StressTestScenario> {
    vec![
        StressTestScenario::new("Financial Crisis", StressType::MarketCrash, Severity::Severe)
            .with_param("crash_factor", 0.3)
            .with_param("vol_factor", 1.0),
        StressTestScenario::new("Pandemic Crash", StressType::MarketCrash, Severity::Moderate)
            .with_param("crash_factor", 0.3)
            .with_param("vol_factor", 1.0),
        StressTestScenario::new(
            "Interest Rate Shock",
            StressType::InterestRateChange,
            Severity::Moderate,
        )
        .with_param("rate_shift", 0.02)
        .with_param("rate_sensitivity", 10.0),
        StressTestScenario::new("Flash Crash", StressType::LiquidityCrisis, Severity::Severe)
            .with_param("vol_factor", 1.5)
            .with_param("horizon_days", 30.0),
        StressTestScenario::new(
            "Volatility Spike",
            StressType::VolatilitySpike,
            Severity::Moderate,
        )
        .with_param("vol_factor", 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenariolab_core::rng::SeededRandom;

    fn reference() -> StressConfig {
        StressConfig::default()
    }

    #[test]
    fn shock_table() {
        let crash = apply_shock(
            &StressTestScenario::new("c", StressType::MarketCrash, Severity::Severe),
            &reference(),
        );
        assert!((crash.price - 40.0).abs() < 1e-12);
        assert!((crash.volatility - 0.6).abs() < 1e-12);

        let spike = apply_shock(
            &StressTestScenario::new("v", StressType::VolatilitySpike, Severity::Mild),
            &reference(),
        );
        assert_eq!(spike.price, 100.0);
        assert!((spike.volatility - 0.4).abs() < 1e-12);

        let rates = apply_shock(
            &StressTestScenario::new("r", StressType::InterestRateChange, Severity::Moderate),
            &reference(),
        );
        assert!((rates.price - 80.0).abs() < 1e-12);
        assert_eq!(rates.volatility, 0.2);

        let liquidity = apply_shock(
            &StressTestScenario::new("l", StressType::LiquidityCrisis, Severity::Moderate),
            &reference(),
        );
        assert!((liquidity.volatility - 0.5).abs() < 1e-12);
        assert_eq!(liquidity.drift, -0.1);
        assert_eq!(liquidity.horizon_days, 30.0);
    }

    #[test]
    fn parameters_override_defaults() {
        let stress = StressTestScenario::new("c", StressType::MarketCrash, Severity::Moderate)
            .with_param("crash_factor", 0.5)
            .with_param("drift", 0.0);
        let shocked = apply_shock(&stress, &reference());
        assert!((shocked.price - 50.0).abs() < 1e-12);
        assert_eq!(shocked.drift, 0.0);
    }

    #[test]
    fn recovery_time_cases() {
        assert_eq!(recovery_time(&[]), 0);
        // never below zero, so never "recovers"
        assert_eq!(recovery_time(&[0.1, 0.2]), 2);
        // cumulative: -0.1, -0.3, -0.1, 0.05
        assert_eq!(recovery_time(&[-0.1, -0.2, 0.2, 0.15]), 3);
        // first recovery wins even if a deeper dip follows
        assert_eq!(recovery_time(&[-0.1, 0.2, -0.5, 0.01]), 1);
        assert_eq!(recovery_time(&[-0.1, 0.05, -0.2]), 3);
    }

    #[test]
    fn max_loss_from_zero_baseline() {
        assert_eq!(max_loss(&[0.1, 0.2]), 0.0);
        assert!((max_loss(&[0.1, -0.3, 0.05]) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn score_bounds() {
        assert_eq!(stress_impact_score(0.0, 0.0, 0.0), 50.0);
        assert_eq!(stress_impact_score(-5.0, -5.0, 5.0), 0.0);
        assert_eq!(stress_impact_score(5.0, 0.0, 0.0), 100.0);
        let s = stress_impact_score(-0.2, -0.3, 0.04);
        assert!((s - (30.0 + 20.0 + 46.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn run_produces_hourly_path_metrics() {
        let tester = StressTester::default();
        let stress = StressTestScenario::new("v", StressType::VolatilitySpike, Severity::Moderate);
        let mut rng = SeededRandom::from_seed(1);
        let result = tester.run(&ScenarioId::new("s"), &stress, &mut rng).unwrap();
        assert!((0.0..=100.0).contains(&result.stress_impact_score));
        assert!(result.max_loss <= 0.0);
        assert!(result.recovery_time <= 720);
        assert!(result.risk_metrics.expected_shortfall >= result.risk_metrics.var95);
        assert!((result.risk_metrics.beta - 1.0).abs() < 1e-9);
    }

    #[test]
    fn run_rejects_negative_shocked_price() {
        let stress = StressTestScenario::new("c", StressType::MarketCrash, Severity::Severe)
            .with_param("crash_factor", 0.6);
        let mut rng = SeededRandom::from_seed(1);
        let err = StressTester::default()
            .run(&ScenarioId::new("s"), &stress, &mut rng)
            .unwrap_err();
        assert!(matches!(err, StressError::NonPositiveShockedPrice { .. }));
    }

    #[test]
    fn run_rejects_zero_horizon() {
        let stress = StressTestScenario::new("v", StressType::VolatilitySpike, Severity::Mild)
            .with_param("horizon_days", 0.0);
        let mut rng = SeededRandom::from_seed(1);
        let err = StressTester::default()
            .run(&ScenarioId::new("s"), &stress, &mut rng)
            .unwrap_err();
        assert!(matches!(err, StressError::InvalidHorizon { .. }));
    }

    #[test]
    fn templates_cover_each_type() {
        let templates = stress_test_templates();
        assert_eq!(templates.len(), 5);
        for kind in StressType::ALL {
            assert!(templates.iter().any(|t| t.stress_type == kind), "{kind} missing");
        }
        let mut rng = SeededRandom::from_seed(3);
        for t in &templates {
            StressTester::default()
                .run(&ScenarioId::new("s"), t, &mut rng)
                .unwrap();
        }
    }
}
