//! Engine configuration loaded from TOML.
//!
//! Every field carries a serde default, so an empty file (or no file at all)
//! yields the stock engine: 5% annual drift, hourly steps, 2% risk-free rate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use scenariolab_core::simulator::WalkParams;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value {field} = {value}: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Top-level configuration for the scenario engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Master seed. `None` draws every run from OS entropy.
    pub seed: Option<u64>,
    pub simulation: WalkParams,
    pub risk: RiskConfig,
    pub stress: StressConfig,
    pub alerts: AlertsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub annual_risk_free_rate: f64,
    pub days_per_year: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            annual_risk_free_rate: 0.02,
            days_per_year: 365.0,
        }
    }
}

impl RiskConfig {
    /// Daily risk-free rate used by alpha.
    pub fn risk_free_daily(&self) -> f64 {
        self.annual_risk_free_rate / self.days_per_year
    }
}

/// Reference asset the stress tester shocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub reference_price: f64,
    pub reference_volatility: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            reference_price: 100.0,
            reference_volatility: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Upper bound on a single notification delivery.
    pub notify_timeout_ms: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            notify_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("scenarios"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `SCENARIOLAB_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> ConfigError {
            ConfigError::Invalid {
                field,
                value: value.to_string(),
                reason,
            }
        }

        let sim = &self.simulation;
        if sim.hours_per_day == 0 {
            return Err(invalid("simulation.hours_per_day", 0, "must be at least 1"));
        }
        if !(sim.days_per_year > 0.0) {
            return Err(invalid("simulation.days_per_year", sim.days_per_year, "must be positive"));
        }
        if !(sim.price_floor > 0.0) {
            return Err(invalid("simulation.price_floor", sim.price_floor, "must be positive"));
        }
        if !(0.0..1.0).contains(&sim.volume_jitter) {
            return Err(invalid("simulation.volume_jitter", sim.volume_jitter, "must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&sim.volatility_jitter) {
            return Err(invalid(
                "simulation.volatility_jitter",
                sim.volatility_jitter,
                "must be in [0, 1)",
            ));
        }
        if !(self.risk.days_per_year > 0.0) {
            return Err(invalid("risk.days_per_year", self.risk.days_per_year, "must be positive"));
        }
        if !(self.stress.reference_price > 0.0) {
            return Err(invalid(
                "stress.reference_price",
                self.stress.reference_price,
                "must be positive",
            ));
        }
        if !(self.stress.reference_volatility >= 0.0) {
            return Err(invalid(
                "stress.reference_volatility",
                self.stress.reference_volatility,
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.seed, None);
        assert_eq!(config.simulation.hours_per_day, 24);
        assert_eq!(config.alerts.notify_timeout_ms, 2_000);
        assert_eq!(config.storage.dir, PathBuf::from("scenarios"));
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = EngineConfig::from_toml(
            r#"
seed = 42

[simulation]
annual_drift = 0.08

[risk]
annual_risk_free_rate = 0.0365
"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.simulation.annual_drift, 0.08);
        assert_eq!(config.simulation.price_floor, 0.01);
        assert!((config.risk.risk_free_daily() - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn default_risk_free_matches_core_constant() {
        let risk = RiskConfig::default();
        assert!(
            (risk.risk_free_daily() - scenariolab_core::assessment::DEFAULT_RISK_FREE_DAILY).abs()
                < 1e-15
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let err = EngineConfig::from_toml("[simulation]\nhours_per_day = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "simulation.hours_per_day", .. }));

        let err = EngineConfig::from_toml("[stress]\nreference_price = -1.0\n").unwrap_err();
        assert!(err.to_string().contains("stress.reference_price"));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            EngineConfig::from_toml("seed = \"abc\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
