use backtesting::PortfolioMetrics;
use rayon::prelude::*;
use replay::core::io::PriceSeries;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StrategyConfig;
use crate::error::{Result, StrategyError};
use crate::strategy::GoldenCrossStrategy;

/// Metrics of one (fast, slow) pair. Percent fields are scaled by 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRow {
    #[serde(rename = "Fast")]
    pub fast: usize,
    #[serde(rename = "Slow")]
    pub slow: usize,
    #[serde(rename = "TotalReturnPct")]
    pub total_return_pct: f64,
    #[serde(rename = "SharpeRatio")]
    pub sharpe_ratio: f64,
    #[serde(rename = "SortinoRatio")]
    pub sortino_ratio: f64,
    #[serde(rename = "CalmarRatio")]
    pub calmar_ratio: f64,
    #[serde(rename = "MaxDrawdownPct")]
    pub max_drawdown_pct: f64,
    #[serde(rename = "WinRatePct")]
    pub win_rate_pct: f64,
    #[serde(rename = "NumTrades")]
    pub num_trades: usize,
}

impl OptimizationRow {
    fn from_metrics(fast: usize, slow: usize, m: &PortfolioMetrics) -> Self {
        Self {
            fast,
            slow,
            total_return_pct: m.total_return * 100.0,
            sharpe_ratio: m.sharpe_ratio,
            sortino_ratio: m.sortino_ratio,
            calmar_ratio: m.calmar_ratio,
            max_drawdown_pct: m.max_drawdown * 100.0,
            win_rate_pct: m.win_rate * 100.0,
            num_trades: m.num_trades,
        }
    }
}

/// Results table of a grid search, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub rows: Vec<OptimizationRow>,
}

impl OptimizationResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a given pair, if it was evaluated.
    pub fn get(&self, fast: usize, slow: usize) -> Option<&OptimizationRow> {
        self.rows.iter().find(|r| r.fast == fast && r.slow == slow)
    }
}

/// Valid (fast, slow) pairs: `fast_range` outer, `slow_range` inner,
/// pairs with `fast >= slow` skipped.
pub fn parameter_grid(fast_range: &[usize], slow_range: &[usize]) -> Vec<(usize, usize)> {
    fast_range
        .iter()
        .flat_map(|&f| slow_range.iter().map(move |&s| (f, s)))
        .filter(|&(f, s)| f < s)
        .collect()
}

/// Backtest every valid pair of the grid.
///
/// Capital, fees, annualization and moving-average kind come from `base`;
/// its windows are ignored. Pairs are evaluated in parallel but rows come
/// back in enumeration order. The first failing pair aborts the search.
///
/// # Errors
/// [`StrategyError::EmptyGrid`] when no pair has `fast < slow`, raised before
/// any simulation.
pub fn optimize(
    prices: &PriceSeries,
    fast_range: &[usize],
    slow_range: &[usize],
    base: &StrategyConfig,
) -> Result<OptimizationResult> {
    base.validate_costs()?;
    if fast_range.contains(&0) || slow_range.contains(&0) {
        return Err(StrategyError::ZeroWindow);
    }

    let grid = parameter_grid(fast_range, slow_range);
    if grid.is_empty() {
        return Err(StrategyError::EmptyGrid);
    }

    info!(
        ?fast_range,
        ?slow_range,
        pairs = grid.len(),
        bars = prices.len(),
        "running golden cross optimization"
    );

    let rows = grid
        .par_iter()
        .map(|&(fast, slow)| {
            let strategy = GoldenCrossStrategy::new(StrategyConfig {
                fast_window: fast,
                slow_window: slow,
                ..base.clone()
            })?;
            let run = strategy.evaluate(prices)?;
            let row = OptimizationRow::from_metrics(fast, slow, &run.portfolio.metrics);
            debug!(
                fast,
                slow,
                total_return_pct = row.total_return_pct,
                trades = row.num_trades,
                "evaluated pair"
            );
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(rows = rows.len(), "optimization finished");
    Ok(OptimizationResult { rows })
}
