//! ScenarioLab Runner — orchestration, persistence, stress testing, alerts.
//!
//! This crate builds on `scenariolab-core` to provide:
//! - Engine configuration (TOML)
//! - Strategy evaluation against simulated paths
//! - Scenario orchestrator with the pending/running/completed/failed lifecycle
//! - Scenario and assessment persistence (in-memory and JSON files)
//! - Stress tester with built-in templates and parallel suites
//! - Alert evaluator with repository and notification boundaries
//! - CSV/JSON export and Markdown reports

pub mod alerts;
pub mod config;
pub mod evaluator;
pub mod export;
pub mod orchestrator;
pub mod report;
pub mod store;
pub mod stress;

pub use alerts::{
    default_alert_templates, evaluate_alerts, AlertDraft, AlertError, AlertRepository,
    AlertService, AlertUpdate, DispatchReport, InMemoryAlertRepository, JsonFileAlertRepository,
    LogNotifier, NotificationDispatcher, Notifier, NotifyError,
};
pub use config::{ConfigError, EngineConfig};
pub use evaluator::{evaluate_strategies, EvaluationError, StrategyEvaluation};
pub use orchestrator::{Orchestrator, ScenarioError};
pub use store::{FileScenarioStore, InMemoryScenarioStore, ScenarioStore, StoreError};
pub use stress::{stress_test_templates, StressError, StressTester};
