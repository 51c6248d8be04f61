//! Risk metric bundle and metric-name lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::ScenarioId;

/// Output of the risk assessment.
///
/// `var95`, `var99` and `expected_shortfall` are positive loss magnitudes.
/// `expected_shortfall >= var95` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub var95: f64,
    pub var99: f64,
    pub expected_shortfall: f64,
    pub max_drawdown: f64,
    pub beta: f64,
    pub alpha: f64,
}

impl RiskMetrics {
    pub fn get(&self, metric: RiskMetric) -> f64 {
        match metric {
            RiskMetric::Var95 => self.var95,
            RiskMetric::Var99 => self.var99,
            RiskMetric::ExpectedShortfall => self.expected_shortfall,
            RiskMetric::MaxDrawdown => self.max_drawdown,
            RiskMetric::Beta => self.beta,
            RiskMetric::Alpha => self.alpha,
        }
    }
}

/// Names of the fields of [`RiskMetrics`], used by alert configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskMetric {
    Var95,
    Var99,
    #[serde(alias = "expected_shortfall")]
    ExpectedShortfall,
    #[serde(alias = "max_drawdown")]
    MaxDrawdown,
    Beta,
    Alpha,
}

impl RiskMetric {
    pub const ALL: [RiskMetric; 6] = [
        RiskMetric::Var95,
        RiskMetric::Var99,
        RiskMetric::ExpectedShortfall,
        RiskMetric::MaxDrawdown,
        RiskMetric::Beta,
        RiskMetric::Alpha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskMetric::Var95 => "var95",
            RiskMetric::Var99 => "var99",
            RiskMetric::ExpectedShortfall => "expectedShortfall",
            RiskMetric::MaxDrawdown => "maxDrawdown",
            RiskMetric::Beta => "beta",
            RiskMetric::Alpha => "alpha",
        }
    }
}

impl fmt::Display for RiskMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "var95" => Ok(RiskMetric::Var95),
            "var99" => Ok(RiskMetric::Var99),
            "expectedShortfall" | "expected_shortfall" => Ok(RiskMetric::ExpectedShortfall),
            "maxDrawdown" | "max_drawdown" => Ok(RiskMetric::MaxDrawdown),
            "beta" => Ok(RiskMetric::Beta),
            "alpha" => Ok(RiskMetric::Alpha),
            other => Err(format!(
                "unknown risk metric '{other}'. Valid: var95, var99, expectedShortfall, maxDrawdown, beta, alpha"
            )),
        }
    }
}

/// Risk metrics snapshot persisted per scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub scenario_id: ScenarioId,
    pub metrics: RiskMetrics,
    pub assessed_at: DateTime<Utc>,
}
