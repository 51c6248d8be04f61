//! Markdown reports for scenarios and stress suites.

use scenariolab_core::domain::{Scenario, StrategyKind, StressTestResult};

fn format_ratio(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// Generate a Markdown report for a single scenario.
pub fn generate_report(scenario: &Scenario) -> String {
    let p = &scenario.parameters;
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# Scenario Report: {}\n\n", p.name));
    if !p.description.is_empty() {
        md.push_str(&format!("{}\n\n", p.description));
    }

    // Metadata
    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Scenario ID | `{}` |\n", scenario.id));
    md.push_str(&format!("| Status | {:?} |\n", scenario.status));
    md.push_str(&format!("| Duration | {} days |\n", p.duration_days));
    md.push_str(&format!("| Created | {} |\n", scenario.created_at.to_rfc3339()));
    md.push_str(&format!("| Updated | {} |\n", scenario.updated_at.to_rfc3339()));
    if let Some(err) = &scenario.error {
        md.push_str(&format!("| Error | {} |\n", err));
    }
    md.push('\n');

    // Market
    md.push_str("## Initial Market Conditions\n\n");
    md.push_str("| Symbol | Price | Volatility | Volume |\n");
    md.push_str("| --- | --- | --- | --- |\n");
    for c in &p.market_conditions {
        md.push_str(&format!(
            "| {} | {:.2} | {:.1}% | {} |\n",
            c.symbol,
            c.price,
            c.volatility * 100.0,
            c.volume
        ));
    }
    md.push('\n');

    // Strategies, with realized returns when the scenario has run
    if !p.strategies.is_empty() {
        let returns = scenario.results.as_ref().map(|r| &r.strategy_returns);
        md.push_str("## Strategies\n\n");
        md.push_str("| Strategy | Symbol | Type | Entry | Exit | Qty | Return |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- | --- |\n");
        for (i, s) in p.strategies.iter().enumerate() {
            let kind = match s.kind {
                StrategyKind::Long => "long",
                StrategyKind::Short => "short",
                StrategyKind::Neutral => "neutral",
            };
            let exit = s
                .exit_price
                .map(|x| format!("{:.2}", x))
                .unwrap_or_else(|| "final".to_string());
            let ret = returns
                .and_then(|r| r.get(i))
                .map(|r| format!("{:+.2}%", r * 100.0))
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} | {:.2} | {} | {} | {} |\n",
                s.name, s.symbol, kind, s.entry_price, exit, s.quantity, ret
            ));
        }
        md.push('\n');
    }

    let Some(r) = &scenario.results else {
        md.push_str("_No results yet._\n");
        return md;
    };

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Return | {:+.2}% |\n", r.total_return * 100.0));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", r.max_drawdown * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", r.sharpe_ratio));
    md.push_str(&format!("| Volatility | {:.4} |\n", r.volatility));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", r.win_rate * 100.0));
    md.push_str(&format!("| Profit Factor | {} |\n", format_ratio(r.profit_factor)));
    md.push('\n');

    let m = &r.risk_metrics;
    md.push_str("## Risk Metrics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| VaR 95% | {:.2}% |\n", m.var95 * 100.0));
    md.push_str(&format!("| VaR 99% | {:.2}% |\n", m.var99 * 100.0));
    md.push_str(&format!("| Expected Shortfall | {:.2}% |\n", m.expected_shortfall * 100.0));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Beta | {:.3} |\n", m.beta));
    md.push_str(&format!("| Alpha | {:+.5} |\n", m.alpha));
    md.push('\n');
    md.push_str(
        "_Drawdowns are absolute declines of the cumulative return from a zero baseline._\n",
    );

    md
}

/// Side-by-side Markdown table for a stress suite, worst score first.
pub fn generate_stress_report(results: &[StressTestResult]) -> String {
    let mut md = String::from("# Stress Test Report\n\n");
    if results.is_empty() {
        md.push_str("_No stress scenarios were run._\n");
        return md;
    }

    let mut sorted: Vec<&StressTestResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.stress_impact_score.total_cmp(&b.stress_impact_score));

    md.push_str(
        "| Scenario | Type | Severity | Total Return | Max Loss | VaR 95% | Recovery | Score |\n",
    );
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- |\n");
    for r in sorted {
        let s = &r.stress_scenario;
        md.push_str(&format!(
            "| {} | {} | {} | {:+.2}% | {:+.2}% | {:.2}% | {} | {:.1} |\n",
            s.name,
            s.stress_type,
            s.severity,
            r.total_return * 100.0,
            r.max_loss * 100.0,
            r.risk_metrics.var95 * 100.0,
            r.recovery_time,
            r.stress_impact_score
        ));
    }
    md
}
