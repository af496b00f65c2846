//! Golden Cross moving-average crossover: single backtests and
//! (fast, slow) grid optimization over OHLCV data.

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod optimization;
pub mod ranking;
pub mod strategy;

pub use config::{Config, OptimizationConfig, StrategyConfig};
pub use data::load_price_series;
pub use error::StrategyError;
pub use evaluation::{write_backtest_summary, write_optimization_summary};
pub use export::{read_optimization_csv, write_optimization_csv};
pub use optimization::{OptimizationResult, OptimizationRow, optimize, parameter_grid};
pub use ranking::{Metric, Ranking, rank};
pub use strategy::{BacktestRun, GoldenCrossStrategy, Signals};
