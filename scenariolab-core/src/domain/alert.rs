//! Alert configurations and triggered-alert records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::AlertId;
use super::risk::RiskMetric;

/// Breach direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    /// Strict comparison: a value equal to the threshold never breaches.
    pub fn is_breached(&self, value: f64, threshold: f64) -> bool {
        match self {
            AlertCondition::Above => value > threshold,
            AlertCondition::Below => value < threshold,
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertCondition::Above => "above",
            AlertCondition::Below => "below",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    /// Classify by relative deviation `|value - threshold| / |threshold|`.
    ///
    /// `> 0.5` is high, `> 0.2` medium, anything else low. A zero threshold
    /// makes every breach high.
    pub fn from_deviation(value: f64, threshold: f64) -> Self {
        if threshold == 0.0 {
            return if value == threshold {
                AlertSeverity::Low
            } else {
                AlertSeverity::High
            };
        }
        let deviation = (value - threshold).abs() / threshold.abs();
        if deviation > 0.5 {
            AlertSeverity::High
        } else if deviation > 0.2 {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        })
    }
}

/// A user-defined threshold on one risk metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    pub id: AlertId,
    pub name: String,
    pub risk_metric: RiskMetric,
    pub threshold: f64,
    pub condition: AlertCondition,
    pub enabled: bool,
}

/// Emitted when an enabled configuration is breached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredAlert {
    pub alert_id: AlertId,
    pub alert_name: String,
    pub user_id: String,
    pub risk_metric: RiskMetric,
    pub threshold: f64,
    pub current_value: f64,
    pub condition: AlertCondition,
    pub severity: AlertSeverity,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breach_is_strict() {
        assert!(AlertCondition::Above.is_breached(0.08, 0.05));
        assert!(!AlertCondition::Above.is_breached(0.05, 0.05));
        assert!(AlertCondition::Below.is_breached(-0.01, 0.0));
        assert!(!AlertCondition::Below.is_breached(0.0, 0.0));
    }

    #[test]
    fn severity_bands() {
        // deviation 0.6
        assert_eq!(AlertSeverity::from_deviation(0.08, 0.05), AlertSeverity::High);
        // deviation 0.3
        assert_eq!(AlertSeverity::from_deviation(0.13, 0.10), AlertSeverity::Medium);
        // deviation 0.1
        assert_eq!(AlertSeverity::from_deviation(0.11, 0.10), AlertSeverity::Low);
    }

    #[test]
    fn negative_threshold_uses_magnitude() {
        // |(-0.2) - (-0.1)| / 0.1 = 1.0
        assert_eq!(AlertSeverity::from_deviation(-0.2, -0.1), AlertSeverity::High);
        // |(-0.13) - (-0.1)| / 0.1 = 0.3
        assert_eq!(AlertSeverity::from_deviation(-0.13, -0.1), AlertSeverity::Medium);
    }

    #[test]
    fn zero_threshold_breach_is_high() {
        assert_eq!(AlertSeverity::from_deviation(-0.001, 0.0), AlertSeverity::High);
    }
}
