use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::optimization::{OptimizationResult, OptimizationRow};

/// Metric an optimization table can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    TotalReturn,
    SharpeRatio,
    CalmarRatio,
    SortinoRatio,
    WinRate,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::TotalReturn,
        Metric::SharpeRatio,
        Metric::CalmarRatio,
        Metric::SortinoRatio,
        Metric::WinRate,
    ];

    /// Human-readable name, as shown in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::TotalReturn => "Total Return",
            Metric::SharpeRatio => "Sharpe Ratio",
            Metric::CalmarRatio => "Calmar Ratio",
            Metric::SortinoRatio => "Sortino Ratio",
            Metric::WinRate => "Win Rate",
        }
    }

    /// Value of this metric in a result row.
    pub fn value(self, row: &OptimizationRow) -> f64 {
        match self {
            Metric::TotalReturn => row.total_return_pct,
            Metric::SharpeRatio => row.sharpe_ratio,
            Metric::CalmarRatio => row.calmar_ratio,
            Metric::SortinoRatio => row.sortino_ratio,
            Metric::WinRate => row.win_rate_pct,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Metric {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "total_return" | "return" | "total_return_pct" => Ok(Metric::TotalReturn),
            "sharpe_ratio" | "sharpe" => Ok(Metric::SharpeRatio),
            "calmar_ratio" | "calmar" => Ok(Metric::CalmarRatio),
            "sortino_ratio" | "sortino" => Ok(Metric::SortinoRatio),
            "win_rate" | "winrate" | "win_rate_pct" => Ok(Metric::WinRate),
            _ => Err(StrategyError::UnknownMetric(s.to_string())),
        }
    }
}

/// Rows of an optimization ordered best-first by one metric.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    pub metric: Metric,
    rows: Vec<&'a OptimizationRow>,
}

impl<'a> Ranking<'a> {
    pub fn best(&self) -> Option<&'a OptimizationRow> {
        self.rows.first().copied()
    }

    pub fn rows(&self) -> &[&'a OptimizationRow] {
        &self.rows
    }

    pub fn top(&self, n: usize) -> &[&'a OptimizationRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Order `result` descending by `metric`.
///
/// The sort is stable, so rows with equal values keep their enumeration
/// order. NaN values rank last. `result` itself is left untouched.
pub fn rank(result: &OptimizationResult, metric: Metric) -> Ranking<'_> {
    let key = |row: &OptimizationRow| {
        let v = metric.value(row);
        if v.is_nan() { f64::NEG_INFINITY } else { v + 0.0 }
    };
    let mut rows: Vec<&OptimizationRow> = result.rows.iter().collect();
    rows.sort_by(|a, b| key(b).total_cmp(&key(a)));
    Ranking { metric, rows }
}
