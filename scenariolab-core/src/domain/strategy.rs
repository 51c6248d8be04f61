//! TradingStrategy — a declared position evaluated against a simulated path.

use serde::{Deserialize, Serialize};

/// Direction of a declared position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Long,
    Short,
    Neutral,
}

/// A declared position: entry, optional exit, size.
///
/// Immutable once a scenario runs. When `exit_price` is absent the final
/// simulated price of `symbol` is used as the exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStrategy {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    pub entry_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
}

impl TradingStrategy {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        kind: StrategyKind,
        entry_price: f64,
        quantity: f64,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            symbol: symbol.into(),
            kind,
            entry_price,
            exit_price: None,
            quantity,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn with_exit(mut self, exit_price: f64) -> Self {
        self.exit_price = Some(exit_price);
        self
    }

    /// Scalar return of the position when it closes at `exit_price`.
    ///
    /// Long: `(exit - entry) / entry * qty`; short: `(entry - exit) / entry * qty`;
    /// neutral always contributes zero.
    pub fn return_at(&self, exit_price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        match self.kind {
            StrategyKind::Long => (exit_price - self.entry_price) / self.entry_price * self.quantity,
            StrategyKind::Short => {
                (self.entry_price - exit_price) / self.entry_price * self.quantity
            }
            StrategyKind::Neutral => 0.0,
        }
    }
}
