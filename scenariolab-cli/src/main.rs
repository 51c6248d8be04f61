//! ScenarioLab CLI — scenario, simulation, stress test, and alert commands.
//!
//! Commands:
//! - `simulate path` — one GBM / jump-diffusion price path
//! - `simulate market` — hourly multi-asset walk from a JSON list of conditions
//! - `create`, `run`, `show`, `list`, `delete` — scenario lifecycle
//! - `stress` — stress suite against an existing scenario
//! - `templates` — built-in stress and alert templates
//! - `assessment` — latest risk assessment of a scenario
//! - `alerts` — per-user alert configuration and checks

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use scenariolab_core::domain::{
    AlertCondition, AlertId, MarketCondition, RiskMetric, Scenario, ScenarioId,
    ScenarioParameters, ScenarioResult, StressTestScenario,
};
use scenariolab_core::simulator::SimulationModel;
use scenariolab_runner::export::{
    export_conditions_csv, export_price_path_csv, export_scenario_json,
    export_stress_results_csv, save_artifacts,
};
use scenariolab_runner::report::{generate_report, generate_stress_report};
use scenariolab_runner::{
    default_alert_templates, stress_test_templates, AlertDraft, AlertService, AlertUpdate,
    EngineConfig, FileScenarioStore, JsonFileAlertRepository, LogNotifier,
    NotificationDispatcher, Orchestrator,
};

#[derive(Parser)]
#[command(
    name = "scenariolab",
    about = "ScenarioLab CLI — market scenario simulation and risk engine"
)]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scenario store directory. Overrides `[storage] dir` from the config.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate prices without creating a scenario.
    Simulate {
        #[command(subcommand)]
        target: SimulateTarget,
    },
    /// Create a scenario from a JSON parameters file.
    Create {
        /// Path to a JSON file with `name`, `durationDays`, `marketConditions`, `strategies`.
        file: PathBuf,
    },
    /// Run one or more scenarios.
    Run {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Write scenario.json, report.md and chart.json under this directory.
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Check this user's alerts against each completed run.
        #[arg(long)]
        alert_user: Option<String>,
    },
    /// Show one scenario as a Markdown report.
    Show {
        id: String,

        /// Print the raw JSON record instead.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List stored scenarios, oldest first.
    List,
    /// Delete a scenario and its assessment.
    Delete { id: String },
    /// Run stress scenarios against an existing scenario.
    Stress {
        id: String,

        /// JSON file with a list of stress scenarios. Defaults to the built-in templates.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Also write the results as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the built-in stress and alert templates as JSON.
    Templates,
    /// Print the latest risk assessment of a scenario.
    Assessment { id: String },
    /// Alert configuration and checks.
    Alerts {
        #[command(subcommand)]
        action: AlertAction,
    },
}

#[derive(Subcommand)]
enum SimulateTarget {
    /// Single price path from GBM, or jump-diffusion when --jump-intensity is set.
    Path {
        #[arg(long, default_value_t = 100.0)]
        initial_price: f64,
        #[arg(long, default_value_t = 0.05)]
        drift: f64,
        #[arg(long, default_value_t = 0.2)]
        volatility: f64,
        /// Horizon in years.
        #[arg(long, default_value_t = 1.0)]
        horizon: f64,
        #[arg(long, default_value_t = 252)]
        steps: usize,
        /// Expected jumps per year.
        #[arg(long)]
        jump_intensity: Option<f64>,
        #[arg(long, default_value_t = -0.05)]
        jump_mean: f64,
        #[arg(long, default_value_t = 0.1)]
        jump_std: f64,
        /// Write the path as CSV instead of printing a summary.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Hourly walk of every symbol in a JSON list of market conditions.
    Market {
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        days: u32,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConditionArg {
    Above,
    Below,
}

impl From<ConditionArg> for AlertCondition {
    fn from(arg: ConditionArg) -> Self {
        match arg {
            ConditionArg::Above => AlertCondition::Above,
            ConditionArg::Below => AlertCondition::Below,
        }
    }
}

#[derive(Subcommand)]
enum AlertAction {
    /// Create an alert for a user.
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        /// var95, var99, expectedShortfall, maxDrawdown, beta or alpha.
        #[arg(long)]
        metric: RiskMetric,
        #[arg(long, allow_hyphen_values = true)]
        threshold: f64,
        #[arg(long, value_enum)]
        condition: ConditionArg,
        #[arg(long, default_value_t = false)]
        disabled: bool,
    },
    /// List a user's alerts.
    List {
        #[arg(long)]
        user: String,
    },
    /// Change fields of an existing alert.
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        metric: Option<RiskMetric>,
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,
        #[arg(long, value_enum)]
        condition: Option<ConditionArg>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Delete an alert.
    Delete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: String,
    },
    /// Check a user's alerts against a scenario's latest assessment.
    Check {
        #[arg(long)]
        user: String,
        #[arg(long)]
        scenario: String,
    },
    /// Install the default alert templates for a user.
    Defaults {
        #[arg(long)]
        user: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.store_dir {
        config.storage.dir = dir.clone();
    }
    init_logging(&config);
    tracing::debug!(
        store = %config.storage.dir.display(),
        seed = ?config.seed,
        "engine configured"
    );

    match cli.command {
        Commands::Simulate { target } => run_simulate(config, target),
        Commands::Create { file } => run_create(config, &file),
        Commands::Run {
            ids,
            artifacts,
            alert_user,
        } => run_scenarios_cmd(config, &ids, artifacts.as_deref(), alert_user.as_deref()),
        Commands::Show { id, json } => run_show(config, &id, json),
        Commands::List => run_list(config),
        Commands::Delete { id } => {
            orchestrator(config)?.delete_scenario(&ScenarioId::new(id.as_str()))?;
            println!("Deleted: {id}");
            Ok(())
        }
        Commands::Stress { id, file, csv } => {
            run_stress(config, &id, file.as_deref(), csv.as_deref())
        }
        Commands::Templates => run_templates(),
        Commands::Assessment { id } => {
            let assessment = orchestrator(config)?.get_risk_assessment(&ScenarioId::new(id))?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            Ok(())
        }
        Commands::Alerts { action } => run_alerts(config, action),
    }
}

fn init_logging(config: &EngineConfig) {
    let filter = EnvFilter::try_from_env("SCENARIOLAB_LOG")
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn orchestrator(config: EngineConfig) -> Result<Orchestrator<FileScenarioStore>> {
    let store = FileScenarioStore::open(&config.storage.dir).with_context(|| {
        format!("failed to open scenario store {}", config.storage.dir.display())
    })?;
    Ok(Orchestrator::new(config, store)?)
}

fn alert_service(config: &EngineConfig) -> Result<AlertService<JsonFileAlertRepository>> {
    let path = config.storage.dir.join("alerts.json");
    let repository = JsonFileAlertRepository::open(&path)
        .with_context(|| format!("failed to open alert repository {}", path.display()))?;
    let dispatcher = NotificationDispatcher::new(
        Arc::new(LogNotifier),
        Duration::from_millis(config.alerts.notify_timeout_ms),
    );
    Ok(AlertService::new(repository).with_dispatcher(dispatcher))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Written: {}", path.display());
    Ok(())
}

fn run_simulate(config: EngineConfig, target: SimulateTarget) -> Result<()> {
    let orch = Orchestrator::new(config, scenariolab_runner::InMemoryScenarioStore::new())?;
    match target {
        SimulateTarget::Path {
            initial_price,
            drift,
            volatility,
            horizon,
            steps,
            jump_intensity,
            jump_mean,
            jump_std,
            out,
        } => {
            let model = match jump_intensity {
                Some(jump_intensity) => SimulationModel::JumpDiffusion {
                    initial_price,
                    drift,
                    volatility,
                    jump_intensity,
                    jump_mean,
                    jump_std,
                    time_horizon: horizon,
                    steps,
                },
                None => SimulationModel::Gbm {
                    initial_price,
                    drift,
                    volatility,
                    time_horizon: horizon,
                    steps,
                },
            };
            let path = orch.run_market_simulation(&model)?;
            match out {
                Some(out) => write_output(&out, &export_price_path_csv(&path)?)?,
                None => print_path_summary(&path),
            }
        }
        SimulateTarget::Market { file, days, out } => {
            let initial: Vec<MarketCondition> = read_json(&file)?;
            let conditions = orch.simulate_conditions(&initial, days)?;
            let csv = export_conditions_csv(&conditions)?;
            match out {
                Some(out) => write_output(&out, &csv)?,
                None => print!("{csv}"),
            }
        }
    }
    Ok(())
}

fn print_path_summary(path: &[f64]) {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return;
    };
    let low = path.iter().copied().fold(f64::INFINITY, f64::min);
    let high = path.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    println!("Steps:    {}", path.len() - 1);
    println!("Start:    {first:.4}");
    println!("End:      {last:.4}");
    println!("Low/High: {low:.4} / {high:.4}");
    println!("Return:   {:+.2}%", (last / first - 1.0) * 100.0);
}

fn run_create(config: EngineConfig, file: &Path) -> Result<()> {
    let parameters: ScenarioParameters = read_json(file)?;
    let scenario = orchestrator(config)?.create_scenario(parameters)?;
    println!("{}", scenario.id);
    Ok(())
}

fn run_scenarios_cmd(
    config: EngineConfig,
    ids: &[String],
    artifacts: Option<&Path>,
    alert_user: Option<&str>,
) -> Result<()> {
    let alerts = alert_user.map(|_| alert_service(&config)).transpose()?;
    let orch = orchestrator(config)?;
    let ids: Vec<ScenarioId> = ids.iter().map(|id| ScenarioId::new(id.as_str())).collect();

    let mut failures = 0;
    for (id, outcome) in ids.iter().zip(orch.run_scenarios(&ids)) {
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Scenario {id} failed: {e}");
                failures += 1;
                continue;
            }
        };
        print_summary(&orch.get_scenario(id)?, &result);

        if let Some(dir) = artifacts {
            let run_dir = save_artifacts(&orch.get_scenario(id)?, dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
        }
        if let (Some(svc), Some(user)) = (&alerts, alert_user) {
            for alert in svc.check_alerts(user, &result.risk_metrics)? {
                println!("ALERT [{}] {}: {}", alert.severity, alert.alert_name, alert.message);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} scenario run(s) failed", ids.len());
    }
    Ok(())
}

fn print_summary(scenario: &Scenario, result: &ScenarioResult) {
    let m = &result.risk_metrics;
    println!();
    println!("=== {} ({}) ===", scenario.parameters.name, scenario.id);
    println!("Total Return:   {:+.2}%", result.total_return * 100.0);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown * 100.0);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!("Win Rate:       {:.1}%", result.win_rate * 100.0);
    if result.profit_factor.is_infinite() {
        println!("Profit Factor:  ∞");
    } else {
        println!("Profit Factor:  {:.2}", result.profit_factor);
    }
    println!("VaR 95/99:      {:.2}% / {:.2}%", m.var95 * 100.0, m.var99 * 100.0);
    println!("Exp. Shortfall: {:.2}%", m.expected_shortfall * 100.0);
    println!("Beta / Alpha:   {:.3} / {:+.5}", m.beta, m.alpha);
}

fn run_show(config: EngineConfig, id: &str, json: bool) -> Result<()> {
    let scenario = orchestrator(config)?.get_scenario(&ScenarioId::new(id))?;
    if json {
        println!("{}", export_scenario_json(&scenario)?);
    } else {
        print!("{}", generate_report(&scenario));
    }
    Ok(())
}

fn run_list(config: EngineConfig) -> Result<()> {
    let scenarios = orchestrator(config)?.list_scenarios()?;
    if scenarios.is_empty() {
        println!("No scenarios.");
        return Ok(());
    }
    println!("{:<38} {:<10} {:<20} {:>10}", "ID", "Status", "Created", "Return");
    println!("{}", "-".repeat(81));
    for s in &scenarios {
        let ret = s
            .results
            .as_ref()
            .map(|r| format!("{:+.2}%", r.total_return * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<10} {:<20} {:>10}",
            s.id,
            format!("{:?}", s.status).to_lowercase(),
            s.created_at.format("%Y-%m-%d %H:%M:%S"),
            ret
        );
    }
    Ok(())
}

fn run_stress(
    config: EngineConfig,
    id: &str,
    file: Option<&Path>,
    csv: Option<&Path>,
) -> Result<()> {
    let stresses: Vec<StressTestScenario> = match file {
        Some(path) => read_json(path)?,
        None => stress_test_templates(),
    };
    let results = orchestrator(config)?.run_stress_suite(&ScenarioId::new(id), &stresses)?;
    print!("{}", generate_stress_report(&results));
    if let Some(path) = csv {
        write_output(path, &export_stress_results_csv(&results)?)?;
    }
    Ok(())
}

fn run_templates() -> Result<()> {
    let templates = serde_json::json!({
        "stress": stress_test_templates(),
        "alerts": default_alert_templates(),
    });
    println!("{}", serde_json::to_string_pretty(&templates)?);
    Ok(())
}

fn run_alerts(config: EngineConfig, action: AlertAction) -> Result<()> {
    let svc = alert_service(&config)?;
    match action {
        AlertAction::Create {
            user,
            name,
            metric,
            threshold,
            condition,
            disabled,
        } => {
            let mut draft = AlertDraft::new(name, metric, threshold, condition.into());
            if disabled {
                draft = draft.disabled();
            }
            let alert = svc.create_alert(&user, draft)?;
            println!("{}", alert.id);
        }
        AlertAction::List { user } => {
            for a in svc.get_user_alerts(&user)? {
                println!(
                    "{}  {:<20} {} {} {} {}",
                    a.id,
                    a.name,
                    a.risk_metric,
                    a.condition,
                    a.threshold,
                    if a.enabled { "enabled" } else { "disabled" }
                );
            }
        }
        AlertAction::Update {
            user,
            id,
            name,
            metric,
            threshold,
            condition,
            enabled,
        } => {
            let update = AlertUpdate {
                name,
                risk_metric: metric,
                threshold,
                condition: condition.map(Into::into),
                enabled,
            };
            let alert = svc.update_alert(&user, &AlertId::new(id), update)?;
            println!("{}", serde_json::to_string_pretty(&alert)?);
        }
        AlertAction::Delete { user, id } => {
            svc.delete_alert(&user, &AlertId::new(id.as_str()))?;
            println!("Deleted: {id}");
        }
        AlertAction::Check { user, scenario } => {
            let assessment = orchestrator(config)?.get_risk_assessment(&ScenarioId::new(scenario))?;
            let triggered = svc.check_alerts(&user, &assessment.metrics)?;
            if triggered.is_empty() {
                println!("No alerts triggered.");
            }
            for alert in &triggered {
                println!("ALERT [{}] {}: {}", alert.severity, alert.alert_name, alert.message);
            }
        }
        AlertAction::Defaults { user } => {
            for draft in default_alert_templates() {
                let alert = svc.create_alert(&user, draft)?;
                println!("{}  {}", alert.id, alert.name);
            }
        }
    }
    Ok(())
}
