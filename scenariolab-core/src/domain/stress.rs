//! Stress scenario definitions and results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::ScenarioId;
use super::risk::RiskMetrics;

/// Kind of market dislocation applied to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressType {
    MarketCrash,
    VolatilitySpike,
    InterestRateChange,
    LiquidityCrisis,
}

impl StressType {
    pub const ALL: [StressType; 4] = [
        StressType::MarketCrash,
        StressType::VolatilitySpike,
        StressType::InterestRateChange,
        StressType::LiquidityCrisis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StressType::MarketCrash => "market_crash",
            StressType::VolatilitySpike => "volatility_spike",
            StressType::InterestRateChange => "interest_rate_change",
            StressType::LiquidityCrisis => "liquidity_crisis",
        }
    }
}

impl fmt::Display for StressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How aggressively a stress scenario perturbs the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Stress severity multiplier: 0.5 / 1.0 / 2.0.
    pub fn multiplier(&self) -> f64 {
        match self {
            Severity::Mild => 0.5,
            Severity::Moderate => 1.0,
            Severity::Severe => 2.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        })
    }
}

/// A named stress scenario.
///
/// `parameters` is a free-form numeric map read by the type-specific shock
/// function; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressTestScenario {
    pub name: String,
    #[serde(rename = "type")]
    pub stress_type: StressType,
    pub severity: Severity,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl StressTestScenario {
    pub fn new(name: impl Into<String>, stress_type: StressType, severity: Severity) -> Self {
        Self {
            name: name.into(),
            stress_type,
            severity,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn param_or(&self, key: &str, default: f64) -> f64 {
        self.parameters
            .get(key)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }
}

/// Outcome of one stress run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressTestResult {
    pub scenario_id: ScenarioId,
    pub stress_scenario: StressTestScenario,
    pub total_return: f64,
    /// Minimum cumulative return reached (0 or negative).
    pub max_loss: f64,
    pub risk_metrics: RiskMetrics,
    /// Index of the first step back at or above break-even after a dip
    /// below it; the series length when that never happens.
    pub recovery_time: usize,
    /// 0–100, higher means less damage.
    pub stress_impact_score: f64,
}
