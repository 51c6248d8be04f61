//! Export — JSON, CSV, and chart payloads for scenario artifacts.
//!
//! Read-only transforms: nothing here feeds back into a run.
//! - **JSON**: full scenario round-trip (profit factor keeps its `"Infinity"` form)
//! - **CSV**: price paths, simulated market conditions, stress results
//! - **Chart payload**: metric table, cumulative returns, return histogram

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scenariolab_core::domain::{MarketCondition, RiskMetric, Scenario, ScenarioResult, StressTestResult};
use scenariolab_core::stats::cumulative_sum;

use crate::report::generate_report;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_scenario_json(scenario: &Scenario) -> Result<String> {
    serde_json::to_string_pretty(scenario).context("failed to serialize Scenario to JSON")
}

pub fn import_scenario_json(json: &str) -> Result<Scenario> {
    serde_json::from_str(json).context("failed to deserialize Scenario from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a single price path as `step,price`.
pub fn export_price_path_csv(path: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["step", "price"])?;
    for (i, price) in path.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.6}", price)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export simulated market conditions, one row per symbol and hour.
pub fn export_conditions_csv(conditions: &[MarketCondition]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "timestamp", "price", "volatility", "volume"])?;
    for c in conditions {
        wtr.write_record([
            &c.symbol,
            &c.timestamp.to_rfc3339(),
            &format!("{:.6}", c.price),
            &format!("{:.6}", c.volatility),
            &c.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_stress_results_csv(results: &[StressTestResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "name",
        "type",
        "severity",
        "total_return",
        "max_loss",
        "var95",
        "expected_shortfall",
        "recovery_time",
        "stress_impact_score",
    ])?;
    for r in results {
        let s = &r.stress_scenario;
        wtr.write_record([
            &s.name,
            s.stress_type.as_str(),
            &s.severity.to_string(),
            &format!("{:.6}", r.total_return),
            &format!("{:.6}", r.max_loss),
            &format!("{:.6}", r.risk_metrics.var95),
            &format!("{:.6}", r.risk_metrics.expected_shortfall),
            &r.recovery_time.to_string(),
            &format!("{:.2}", r.stress_impact_score),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Chart payload ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Everything a chart front-end needs from one scenario result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    pub metrics: Vec<(String, f64)>,
    pub cumulative_returns: Vec<f64>,
    pub return_distribution: Vec<HistogramBin>,
}

/// Build the chart payload with `bins` equal-width histogram buckets.
pub fn chart_payload(result: &ScenarioResult, bins: usize) -> ChartPayload {
    let mut metrics = vec![
        ("totalReturn".to_string(), result.total_return),
        ("maxDrawdown".to_string(), result.max_drawdown),
        ("sharpeRatio".to_string(), result.sharpe_ratio),
        ("volatility".to_string(), result.volatility),
        ("winRate".to_string(), result.win_rate),
    ];
    if result.profit_factor.is_finite() {
        metrics.push(("profitFactor".to_string(), result.profit_factor));
    }
    metrics.extend(
        RiskMetric::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), result.risk_metrics.get(*m))),
    );

    ChartPayload {
        metrics,
        cumulative_returns: cumulative_sum(&result.strategy_returns),
        return_distribution: histogram(&result.strategy_returns, bins),
    }
}

fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi <= lo {
        return vec![HistogramBin {
            lower: lo,
            upper: hi,
            count: values.len(),
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save a scenario's artifact set under `output_dir/<scenario id>/`:
/// - `scenario.json` — the full scenario record
/// - `report.md` — Markdown summary
/// - `chart.json` — chart payload (only when results exist)
///
/// Returns the path to the created directory.
pub fn save_artifacts(scenario: &Scenario, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(scenario.id.as_str());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("scenario.json"), export_scenario_json(scenario)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(scenario))?;
    if let Some(result) = &scenario.results {
        let chart = serde_json::to_string_pretty(&chart_payload(result, 10))
            .context("failed to serialize chart payload")?;
        std::fs::write(run_dir.join("chart.json"), chart)?;
    }

    Ok(run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scenariolab_core::domain::{RiskMetrics, ScenarioId, ScenarioParameters};
    use tempfile::TempDir;

    fn result(returns: Vec<f64>) -> ScenarioResult {
        ScenarioResult {
            scenario_id: ScenarioId::new("s"),
            total_return: returns.iter().sum(),
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            volatility: 0.0,
            win_rate: 1.0,
            profit_factor: f64::INFINITY,
            risk_metrics: RiskMetrics::default(),
            strategy_returns: returns,
            completed_at: Utc::now(),
        }
    }

    fn scenario_with_result() -> Scenario {
        let mut scenario = Scenario::new(
            ScenarioId::new("artifact-test"),
            ScenarioParameters {
                name: "artifacts".into(),
                description: String::new(),
                duration_days: 1,
                market_conditions: vec![MarketCondition::new("X", 10.0, 0.1, 100)],
                strategies: vec![],
            },
        );
        scenario.results = Some(result(vec![0.1, 0.2]));
        scenario
    }

    #[test]
    fn price_path_csv_has_header_and_rows() {
        let csv = export_price_path_csv(&[100.0, 101.5]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "step,price");
        assert_eq!(lines[1], "0,100.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn conditions_csv_columns() {
        let csv = export_conditions_csv(&[MarketCondition::new("AAA", 1.0, 0.2, 5)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("symbol,timestamp,price,volatility,volume"));
        assert!(lines.next().unwrap().starts_with("AAA,"));
    }

    #[test]
    fn scenario_json_roundtrip_keeps_infinity() {
        let scenario = scenario_with_result();
        let json = export_scenario_json(&scenario).unwrap();
        assert!(json.contains("\"Infinity\""));
        let back = import_scenario_json(&json).unwrap();
        assert!(back.results.unwrap().profit_factor.is_infinite());
    }

    #[test]
    fn chart_payload_shapes() {
        let payload = chart_payload(&result(vec![-0.1, 0.0, 0.1, 0.1]), 2);
        assert_eq!(payload.cumulative_returns.len(), 4);
        assert_eq!(payload.return_distribution.len(), 2);
        let counted: usize = payload.return_distribution.iter().map(|b| b.count).sum();
        assert_eq!(counted, 4);
        assert!(payload.metrics.iter().all(|(name, _)| name != "profitFactor"));
        assert!(payload.metrics.iter().any(|(name, _)| name == "var95"));
    }

    #[test]
    fn histogram_of_constant_series() {
        let bins = histogram(&[0.5, 0.5], 4);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn save_artifacts_writes_bundle() {
        let tmp = TempDir::new().unwrap();
        let dir = save_artifacts(&scenario_with_result(), tmp.path()).unwrap();
        assert!(dir.join("scenario.json").exists());
        assert!(dir.join("report.md").exists());
        assert!(dir.join("chart.json").exists());
    }
}
