//! Alert delivery boundary.
//!
//! Delivery is fire-and-forget from the risk pipeline's point of view:
//! [`NotificationDispatcher`] runs the notifier on a worker thread, waits at
//! most the configured timeout, and only ever logs what went wrong.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use scenariolab_core::domain::TriggeredAlert;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// A delivery channel for triggered alerts (webhook, email, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &TriggeredAlert) -> Result<(), NotifyError>;
}

/// Writes each triggered alert to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &TriggeredAlert) -> Result<(), NotifyError> {
        tracing::warn!(
            user = %alert.user_id,
            alert = %alert.alert_name,
            metric = %alert.risk_metric,
            value = alert.current_value,
            threshold = alert.threshold,
            severity = %alert.severity,
            "{}",
            alert.message
        );
        Ok(())
    }
}

/// Outcome counts of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Alerts whose delivery had not finished when the timeout elapsed.
    pub timed_out: usize,
}

/// Runs a [`Notifier`] off the caller's thread with a bounded wait.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver `alerts` in order. Never fails and never panics into the caller.
    pub fn dispatch(&self, alerts: &[TriggeredAlert]) -> DispatchReport {
        let mut report = DispatchReport::default();
        if alerts.is_empty() {
            return report;
        }

        let (tx, rx) = mpsc::channel();
        let notifier = Arc::clone(&self.notifier);
        let batch = alerts.to_vec();
        let spawned = thread::Builder::new()
            .name("alert-notifier".into())
            .spawn(move || {
                for alert in &batch {
                    let outcome = notifier.notify(alert);
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not start notifier thread");
            report.failed = alerts.len();
            return report;
        }

        let deadline = Instant::now() + self.timeout;
        for alert in alerts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(alert = %alert.alert_id, error = %e, "alert delivery failed");
                    report.failed += 1;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    report.timed_out = alerts.len() - report.delivered - report.failed;
                    tracing::warn!(
                        pending = report.timed_out,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "alert delivery timed out"
                    );
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    report.failed = alerts.len() - report.delivered;
                    tracing::warn!(
                        undelivered = report.failed,
                        "notifier stopped before finishing (panicked?)"
                    );
                    break;
                }
            }
        }
        report
    }
}
