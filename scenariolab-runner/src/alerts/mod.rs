//! Alert evaluator — per-user thresholds on risk metrics.
//!
//! Configuration CRUD goes through an [`AlertRepository`]; `check_alerts`
//! is a pure comparison over the user's enabled configurations followed by a
//! best-effort hand-off to the notification boundary.

pub mod notify;
pub mod repository;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scenariolab_core::domain::{
    AlertCondition, AlertConfiguration, AlertId, AlertSeverity, RiskMetric, RiskMetrics,
    TriggeredAlert,
};

use crate::store::StoreError;

pub use notify::{DispatchReport, LogNotifier, NotificationDispatcher, Notifier, NotifyError};
pub use repository::{AlertRepository, InMemoryAlertRepository, JsonFileAlertRepository};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert '{id}' not found for user '{user_id}'")]
    NotFound { user_id: String, id: AlertId },
    #[error("invalid alert: {0}")]
    Invalid(String),
    #[error("alert storage error: {0}")]
    Store(#[from] StoreError),
}

/// Fields of a new alert; the id is assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    pub name: String,
    pub risk_metric: RiskMetric,
    pub threshold: f64,
    pub condition: AlertCondition,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AlertDraft {
    pub fn new(
        name: impl Into<String>,
        risk_metric: RiskMetric,
        threshold: f64,
        condition: AlertCondition,
    ) -> Self {
        Self {
            name: name.into(),
            risk_metric,
            threshold,
            condition,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertUpdate {
    pub name: Option<String>,
    pub risk_metric: Option<RiskMetric>,
    pub threshold: Option<f64>,
    pub condition: Option<AlertCondition>,
    pub enabled: Option<bool>,
}

fn check_threshold(threshold: f64) -> Result<(), AlertError> {
    if threshold.is_finite() {
        Ok(())
    } else {
        Err(AlertError::Invalid(format!("threshold must be finite, got {threshold}")))
    }
}

/// Alert CRUD and threshold evaluation over a repository.
#[derive(Debug)]
pub struct AlertService<R: AlertRepository> {
    repository: R,
    dispatcher: Option<NotificationDispatcher>,
}

impl<R: AlertRepository> AlertService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            dispatcher: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: NotificationDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn create_alert(
        &self,
        user_id: &str,
        draft: AlertDraft,
    ) -> Result<AlertConfiguration, AlertError> {
        check_threshold(draft.threshold)?;
        if draft.name.trim().is_empty() {
            return Err(AlertError::Invalid("name must not be empty".into()));
        }
        let config = AlertConfiguration {
            id: AlertId::generate(),
            name: draft.name,
            risk_metric: draft.risk_metric,
            threshold: draft.threshold,
            condition: draft.condition,
            enabled: draft.enabled,
        };
        self.repository.put(user_id, config.clone())?;
        tracing::info!(user = user_id, alert = %config.id, metric = %config.risk_metric, "alert created");
        Ok(config)
    }

    pub fn update_alert(
        &self,
        user_id: &str,
        id: &AlertId,
        update: AlertUpdate,
    ) -> Result<AlertConfiguration, AlertError> {
        let mut config = self
            .repository
            .get(user_id, id)?
            .ok_or_else(|| AlertError::NotFound {
                user_id: user_id.to_string(),
                id: id.clone(),
            })?;

        if let Some(threshold) = update.threshold {
            check_threshold(threshold)?;
            config.threshold = threshold;
        }
        if let Some(name) = update.name {
            config.name = name;
        }
        if let Some(metric) = update.risk_metric {
            config.risk_metric = metric;
        }
        if let Some(condition) = update.condition {
            config.condition = condition;
        }
        if let Some(enabled) = update.enabled {
            config.enabled = enabled;
        }

        self.repository.put(user_id, config.clone())?;
        tracing::info!(user = user_id, alert = %id, "alert updated");
        Ok(config)
    }

    pub fn delete_alert(&self, user_id: &str, id: &AlertId) -> Result<(), AlertError> {
        if !self.repository.delete(user_id, id)? {
            return Err(AlertError::NotFound {
                user_id: user_id.to_string(),
                id: id.clone(),
            });
        }
        tracing::info!(user = user_id, alert = %id, "alert deleted");
        Ok(())
    }

    pub fn get_user_alerts(&self, user_id: &str) -> Result<Vec<AlertConfiguration>, AlertError> {
        Ok(self.repository.list(user_id)?)
    }

    /// Evaluate every enabled alert of `user_id` against `metrics`.
    ///
    /// Triggered alerts are returned in configuration order and handed to the
    /// dispatcher, if one is attached; delivery problems are logged only.
    pub fn check_alerts(
        &self,
        user_id: &str,
        metrics: &RiskMetrics,
    ) -> Result<Vec<TriggeredAlert>, AlertError> {
        let triggered = evaluate_alerts(user_id, &self.repository.list(user_id)?, metrics);

        if let Some(dispatcher) = &self.dispatcher {
            let report = dispatcher.dispatch(&triggered);
            tracing::debug!(
                delivered = report.delivered,
                failed = report.failed,
                timed_out = report.timed_out,
                "alert dispatch finished"
            );
        }
        Ok(triggered)
    }
}

/// Pure threshold check over a set of configurations.
pub fn evaluate_alerts(
    user_id: &str,
    configs: &[AlertConfiguration],
    metrics: &RiskMetrics,
) -> Vec<TriggeredAlert> {
    let now = Utc::now();
    configs
        .iter()
        .filter(|c| c.enabled)
        .filter_map(|c| {
            let value = metrics.get(c.risk_metric);
            if !c.condition.is_breached(value, c.threshold) {
                return None;
            }
            let severity = AlertSeverity::from_deviation(value, c.threshold);
            Some(TriggeredAlert {
                alert_id: c.id.clone(),
                alert_name: c.name.clone(),
                user_id: user_id.to_string(),
                risk_metric: c.risk_metric,
                threshold: c.threshold,
                current_value: value,
                condition: c.condition,
                severity,
                message: format!(
                    "{} is {value:.4}, {} threshold {:.4} ({severity})",
                    c.risk_metric, c.condition, c.threshold
                ),
                triggered_at: now,
            })
        })
        .collect()
}

/// Built-in alert catalogue. Only the VaR and drawdown alerts start enabled.
pub fn default_alert_templates() -> Vec<AlertDraft> {
    vec![
        AlertDraft::new("High VaR", RiskMetric::Var95, 0.05, AlertCondition::Above),
        AlertDraft::new(
            "High Drawdown",
            RiskMetric::MaxDrawdown,
            0.2,
            AlertCondition::Above,
        ),
        AlertDraft::new("Negative Alpha", RiskMetric::Alpha, 0.0, AlertCondition::Below).disabled(),
        AlertDraft::new("High Beta", RiskMetric::Beta, 1.5, AlertCondition::Above).disabled(),
    ]
}
