use backtesting::{PortfolioResult, simulate};
use replay::core::io::PriceSeries;
use tracing::{error, info};

use crate::config::StrategyConfig;
use crate::error::{Result, StrategyError};

/// Entry and exit flags aligned with a price series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals {
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

impl Signals {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.iter().filter(|&&e| e).count()
    }
}

/// Everything produced by one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub portfolio: PortfolioResult,
    pub fast_ma: Vec<f64>,
    pub slow_ma: Vec<f64>,
    pub signals: Signals,
}

/// Mark the bars where `above(fast, slow)` becomes true.
///
/// Comparisons involving NaN are false, so a crossing can only fire once
/// both averages are defined on the current bar.
fn crossings(fast: &[f64], slow: &[f64], above: fn(f64, f64) -> bool) -> Vec<bool> {
    let mut out = vec![false; fast.len()];
    for i in 1..fast.len() {
        out[i] = above(fast[i], slow[i]) && !above(fast[i - 1], slow[i - 1]);
    }
    out
}

/// Dual moving-average crossover strategy.
///
/// Enters when the fast average crosses above the slow one and exits when
/// it crosses below.
#[derive(Debug, Clone)]
pub struct GoldenCrossStrategy {
    config: StrategyConfig,
}

impl GoldenCrossStrategy {
    /// Create a validated strategy; `fast_window >= slow_window` is rejected.
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Fast and slow moving averages of `closes`.
    pub fn calculate_indicators(&self, closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let kind = self.config.ma_kind;
        (
            kind.compute(closes, self.config.fast_window),
            kind.compute(closes, self.config.slow_window),
        )
    }

    /// Entry and exit flags from two aligned moving averages.
    pub fn generate_signals(&self, fast_ma: &[f64], slow_ma: &[f64]) -> Result<Signals> {
        if fast_ma.len() != slow_ma.len() {
            return Err(StrategyError::SignalLength {
                fast: fast_ma.len(),
                slow: slow_ma.len(),
            });
        }

        Ok(Signals {
            entries: crossings(fast_ma, slow_ma, |f, s| f > s),
            exits: crossings(fast_ma, slow_ma, |f, s| f < s),
        })
    }

    /// Compute indicators and signals, then simulate the portfolio.
    pub fn run_backtest(&self, prices: &PriceSeries) -> Result<BacktestRun> {
        let cfg = &self.config;
        info!(
            fast = cfg.fast_window,
            slow = cfg.slow_window,
            cash = cfg.initial_cash,
            fees = cfg.fees,
            bars = prices.len(),
            "running golden cross backtest"
        );

        let run = self
            .evaluate(prices)
            .inspect_err(|e| error!(error = %e, "golden cross backtest failed"))?;

        info!(
            total_return = run.portfolio.metrics.total_return,
            trades = run.portfolio.metrics.num_trades,
            "golden cross backtest finished"
        );

        Ok(run)
    }

    /// Indicators, signals and simulation without run-level logging.
    pub(crate) fn evaluate(&self, prices: &PriceSeries) -> Result<BacktestRun> {
        let (fast_ma, slow_ma) = self.calculate_indicators(prices.closes());
        let signals = self.generate_signals(&fast_ma, &slow_ma)?;
        let portfolio = simulate(
            prices,
            &signals.entries,
            &signals.exits,
            &self.config.settings(),
        )?;

        Ok(BacktestRun {
            portfolio,
            fast_ma,
            slow_ma,
            signals,
        })
    }
}
