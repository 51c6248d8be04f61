//! Domain types for ScenarioLab

pub mod alert;
pub mod ids;
pub mod market;
pub mod risk;
pub mod scenario;
pub mod strategy;
pub mod stress;
pub mod unbounded;

pub use alert::{AlertCondition, AlertConfiguration, AlertSeverity, TriggeredAlert};
pub use ids::{AlertId, ScenarioId};
pub use market::MarketCondition;
pub use risk::{RiskAssessment, RiskMetric, RiskMetrics};
pub use scenario::{Scenario, ScenarioParameters, ScenarioResult, ScenarioStatus, ValidationError};
pub use strategy::{StrategyKind, TradingStrategy};
pub use stress::{Severity, StressTestResult, StressTestScenario, StressType};
