use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::DEFAULT_PERIODS_PER_YEAR;

/// Capital and cost assumptions for one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Starting cash.
    pub initial_cash: f64,
    /// Fee rate applied to the value of every order (0.001 = 0.1%).
    pub fees: f64,
    /// Bars per year, used to annualize Sharpe, Sortino and Calmar.
    pub periods_per_year: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            fees: 0.001,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Entered and exited on a signal.
    Closed,
    /// Still held on the last bar; valued at the last close.
    Open,
}

/// Detailed information about a single round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Index where the trade was opened.
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    /// Price at which the trade was opened.
    pub entry_price: f64,
    /// Index where the trade was closed (last bar for open trades).
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    /// Price at which the trade was closed or marked.
    pub exit_price: f64,
    /// Units held.
    pub size: f64,
    /// Fees paid on entry and exit combined.
    pub fees: f64,
    /// Profit/Loss net of fees.
    pub pnl: f64,
    /// Return on the capital committed at entry, in percent.
    pub return_pct: f64,
    pub status: TradeStatus,
}

impl Trade {
    pub fn duration(&self) -> TimeDelta {
        self.exit_time - self.entry_time
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }
}

/// Ratios may be infinite; JSON has no literal for that, so non-finite
/// values are written as the strings `"inf"`, `"-inf"` or `"NaN"`.
mod non_finite {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Scalar performance figures of one simulation.
///
/// Returns and drawdown are fractions (0.25 = 25%); ratios are annualized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    #[serde(with = "non_finite")]
    pub sharpe_ratio: f64,
    /// `inf` when there are no losing bars and the mean return is positive.
    #[serde(with = "non_finite")]
    pub sortino_ratio: f64,
    /// `inf` when there is no drawdown and the annualized return is positive.
    #[serde(with = "non_finite")]
    pub calmar_ratio: f64,
    /// Deepest peak-to-trough decline, zero or negative.
    pub max_drawdown: f64,
    /// Winning closed trades over closed trades; zero without closed trades.
    pub win_rate: f64,
    /// All trades, including one still open at the end.
    pub num_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Mean P&L of winning trades (zero when none).
    pub avg_win: f64,
    /// Mean P&L of losing trades (zero when none).
    pub avg_loss: f64,
    pub final_value: f64,
    pub total_profit: f64,
    pub total_fees: f64,
    /// Return of holding the asset from the first to the last bar.
    pub buy_hold_return: f64,
    /// `total_return - buy_hold_return`.
    pub outperformance: f64,
}

/// Outcome of a simulation: value and drawdown timelines, trades and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub settings: SimulationSettings,
    /// Bar times, aligned with `value` and `drawdown`.
    pub times: Vec<DateTime<Utc>>,
    /// Portfolio value at each bar close.
    pub value: Vec<f64>,
    /// `value / running peak - 1` at each bar.
    pub drawdown: Vec<f64>,
    pub trades: Vec<Trade>,
    pub metrics: PortfolioMetrics,
}

impl PortfolioResult {
    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn open_trade(&self) -> Option<&Trade> {
        self.trades.iter().find(|t| !t.is_closed())
    }
}
