//! Single-asset, long-only portfolio simulation driven by entry/exit
//! signals, with the performance metrics derived from it.

pub mod core;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;

pub use crate::core::simulate;
pub use error::BacktestError;
pub use metrics::DEFAULT_PERIODS_PER_YEAR;
pub use models::{PortfolioMetrics, PortfolioResult, SimulationSettings, Trade, TradeStatus};
